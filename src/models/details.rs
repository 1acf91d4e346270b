//! Parsed `scontrol show job` output.
//!
//! `scontrol` prints whitespace-separated `Key=Value` tokens spread over
//! several lines. Each token is split on its first `=`, so values that
//! themselves contain `=` survive (`TRES=cpu=4,mem=8G`). Values with embedded
//! spaces (`Comment=two words`) are not reconstructed: the trailing words are
//! dropped because they carry no `=`.

use thiserror::Error;

/// Marker Slurm prints for unset path fields
const NULL_MARKER: &str = "(null)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetailsParseError {
    #[error("scontrol output contained no key=value pairs")]
    Empty,
}

/// Key/value record for one job, in the order `scontrol` printed it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    entries: Vec<(String, String)>,
}

impl JobDetails {
    /// Parse `scontrol show job` text.
    ///
    /// A key that appears twice keeps its first position and its last value.
    pub fn parse(text: &str) -> Result<Self, DetailsParseError> {
        let mut details = JobDetails::default();

        for token in text.split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            details.insert(key, value);
        }

        if details.entries.is_empty() {
            return Err(DetailsParseError::Empty);
        }
        Ok(details)
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// All entries in display order
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value for a key, empty strings included
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for a key, treating empty and `(null)` as absent
    fn present(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty() && *v != NULL_MARKER)
    }

    #[must_use]
    pub fn job_name(&self) -> Option<&str> {
        self.present("JobName")
    }

    #[must_use]
    pub fn std_out(&self) -> Option<&str> {
        self.present("StdOut")
    }

    #[must_use]
    pub fn work_dir(&self) -> Option<&str> {
        self.present("WorkDir")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "JobId=4242 JobName=train_model\n   \
        UserId=alice(1000) GroupId=alice(1000)\n   \
        JobState=RUNNING Reason=None Dependency=(null)\n   \
        TRES=cpu=4,mem=8G,node=1\n   \
        WorkDir=/home/alice/run\n   \
        StdErr=(null)\n   \
        StdOut=/home/alice/run/out.log\n";

    #[test]
    fn test_parse_typed_fields() {
        let details = JobDetails::parse(SAMPLE).unwrap();
        assert_eq!(details.get("JobId"), Some("4242"));
        assert_eq!(details.job_name(), Some("train_model"));
        assert_eq!(details.get("JobState"), Some("RUNNING"));
        assert_eq!(details.std_out(), Some("/home/alice/run/out.log"));
        assert_eq!(details.work_dir(), Some("/home/alice/run"));
    }

    #[test]
    fn test_null_marker_is_absent() {
        let details = JobDetails::parse("JobId=7 StdOut=(null) WorkDir=").unwrap();
        assert_eq!(details.std_out(), None);
        assert_eq!(details.work_dir(), None);
        assert_eq!(details.get("StdOut"), Some("(null)"));
    }

    #[test]
    fn test_value_keeps_inner_equals() {
        let details = JobDetails::parse(SAMPLE).unwrap();
        assert_eq!(details.get("TRES"), Some("cpu=4,mem=8G,node=1"));
    }

    #[test]
    fn test_entries_preserve_order() {
        let details = JobDetails::parse(SAMPLE).unwrap();
        let keys: Vec<&str> = details.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(&keys[..3], &["JobId", "JobName", "UserId"]);
    }

    #[test]
    fn test_values_with_spaces_are_truncated() {
        let details = JobDetails::parse("JobId=1 Comment=two words").unwrap();
        assert_eq!(details.get("Comment"), Some("two"));
        assert_eq!(details.entries().len(), 2);
    }

    #[test]
    fn test_duplicate_key_replaces_value_in_place() {
        let details = JobDetails::parse("A=1 B=2 A=3").unwrap();
        assert_eq!(
            details.entries(),
            &[
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_output_is_error() {
        assert_eq!(JobDetails::parse(""), Err(DetailsParseError::Empty));
        assert_eq!(
            JobDetails::parse("slurm_load_jobs error: Invalid job id specified"),
            Err(DetailsParseError::Empty)
        );
    }
}
