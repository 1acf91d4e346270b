//! Job records as reported by `squeue --json`.
//!
//! [`SqueueJob`] mirrors the wire format and tolerates the shape changes
//! between Slurm releases. [`JobRecord`] is the immutable per-poll value the
//! rest of the program works with.

use serde::{Deserialize, Deserializer};

use super::state::JobState;
use super::time::TimeValue;
use crate::formatting::format_time_used;

/// A job id as it appears on the wire (number on most versions, string on some)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobIdValue {
    Number(u64),
    Text(String),
}

impl Default for JobIdValue {
    fn default() -> Self {
        JobIdValue::Text(String::new())
    }
}

impl std::fmt::Display for JobIdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobIdValue::Number(n) => write!(f, "{}", n),
            JobIdValue::Text(s) => f.write_str(s),
        }
    }
}

/// `job_state` is a string up to Slurm 23.02 and an array of base state plus flags after
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobStateValue {
    Single(String),
    Many(Vec<String>),
}

impl Default for JobStateValue {
    fn default() -> Self {
        JobStateValue::Many(Vec::new())
    }
}

impl JobStateValue {
    #[must_use]
    pub fn parse(&self) -> JobState {
        match self {
            JobStateValue::Single(s) => JobState::from_state_string(s),
            JobStateValue::Many(states) => JobState::from_slurm_state(states),
        }
    }
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One job entry of the `jobs` array in `squeue --json` output
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SqueueJob {
    #[serde(deserialize_with = "null_as_default")]
    pub job_id: JobIdValue,
    #[serde(deserialize_with = "null_as_default")]
    pub partition: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub job_state: JobStateValue,
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: TimeValue,
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: String,
    pub job_reason: Option<String>,
    pub state_reason: Option<String>,
}

impl SqueueJob {
    /// The pending reason, whichever key this Slurm version uses for it
    fn reason(&self) -> Option<&str> {
        self.job_reason
            .as_deref()
            .or(self.state_reason.as_deref())
            .filter(|r| !r.is_empty())
    }
}

/// Where a job is, or why it is not running yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Nodes(String),
    Pending(Option<String>),
}

impl Placement {
    /// Text for the NODELIST(REASON) column
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Placement::Nodes(nodes) => nodes.clone(),
            Placement::Pending(Some(reason)) => format!("({})", reason),
            Placement::Pending(None) => "(PENDING)".to_string(),
        }
    }
}

/// A job visible in one poll. Rebuilt from scratch every refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// Opaque scheduler id; the merge key across polls
    pub id: String,
    pub partition: String,
    pub name: String,
    pub state: JobState,
    /// Epoch seconds; meaningful only while running
    pub start_time: i64,
    pub placement: Placement,
}

impl JobRecord {
    /// Elapsed run time as shown in the TIME column
    #[must_use]
    pub fn time_used(&self, now: i64) -> String {
        format_time_used(self.start_time, self.state, now)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

impl From<SqueueJob> for JobRecord {
    fn from(job: SqueueJob) -> Self {
        let state = job.job_state.parse();
        let placement = if state == JobState::Pending {
            Placement::Pending(job.reason().map(str::to_string))
        } else {
            Placement::Nodes(job.nodes.clone())
        };

        Self {
            id: job.job_id.to_string(),
            partition: job.partition,
            name: job.name,
            state,
            start_time: job.start_time.number(),
            placement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> JobRecord {
        let job: SqueueJob = serde_json::from_str(json).unwrap();
        JobRecord::from(job)
    }

    #[test]
    fn test_legacy_shape() {
        let job = parse(
            r#"{"job_id": 1, "partition": "gpu", "name": "train", "job_state": "PENDING",
                "start_time": 0, "nodes": "", "job_reason": "Resources"}"#,
        );
        assert_eq!(job.id, "1");
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.placement.display(), "(Resources)");
    }

    #[test]
    fn test_modern_shape() {
        let job = parse(
            r#"{"job_id": 2, "partition": "cpu", "name": "sim", "job_state": ["RUNNING"],
                "start_time": {"set": true, "infinite": false, "number": 1700000000},
                "nodes": "node01", "state_reason": "None"}"#,
        );
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.start_time, 1700000000);
        assert_eq!(job.placement, Placement::Nodes("node01".to_string()));
    }

    #[test]
    fn test_pending_without_reason_uses_placeholder() {
        let job = parse(r#"{"job_id": "77_3", "job_state": "PENDING", "job_reason": ""}"#);
        assert_eq!(job.id, "77_3");
        assert_eq!(job.placement.display(), "(PENDING)");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let job = parse(r#"{"job_id": 5}"#);
        assert_eq!(job.partition, "");
        assert_eq!(job.name, "");
        assert_eq!(job.state, JobState::Unknown);
        assert_eq!(job.start_time, 0);
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let job = parse(
            r#"{"job_id": 6, "partition": null, "name": null, "job_state": null,
                "start_time": null, "nodes": null, "job_reason": null}"#,
        );
        assert_eq!(job.id, "6");
        assert_eq!(job.partition, "");
        assert_eq!(job.name, "");
        assert_eq!(job.state, JobState::Unknown);
        assert_eq!(job.start_time, 0);
    }
}
