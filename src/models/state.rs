//! Job state type shared by the gateway, the job table and the renderers.
//!
//! Slurm reports a job's state either as a single string (`"RUNNING"`,
//! `"CANCELLED by 1234"`, short codes like `"PD"`) or, on newer versions,
//! as an array holding the base state followed by any flags
//! (`["PENDING", "REQUEUED"]`). Both shapes collapse into [`JobState`].

/// Job state parsed from Slurm state strings.
///
/// This enum covers the Slurm **base** job states. Flags such as
/// `CONFIGURING` or `REQUEUED` are skipped when a base state is present.
/// See: https://slurm.schedmd.com/job_state_codes.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    #[default]
    Unknown,
    // Active states
    Running,
    Pending,
    Suspended,
    // Transitional flag (commonly shown instead of base state)
    Completing,
    // Successful completion
    Completed,
    // Termination states
    Cancelled,
    Failed,
    Timeout,
    Preempted,
    NodeFail,
    BootFail,
    Deadline,
    OutOfMemory,
}

impl JobState {
    /// Create a JobState from Slurm's state array.
    ///
    /// The first entry naming a known state wins; an array made only of
    /// unrecognised flags yields `Unknown`.
    #[must_use]
    pub fn from_slurm_state(states: &[String]) -> Self {
        states
            .iter()
            .map(|s| Self::from_state_string(s))
            .find(|state| *state != Self::Unknown)
            .unwrap_or_default()
    }

    /// Create a JobState from a single state string.
    ///
    /// Handles both full names (e.g., "RUNNING") and short codes (e.g., "R").
    /// Also handles state strings with additional info like "CANCELLED by 12345".
    #[must_use]
    pub fn from_state_string(state: &str) -> Self {
        match state.split_whitespace().next() {
            // Active states
            Some("RUNNING") | Some("R") => Self::Running,
            Some("PENDING") | Some("PD") => Self::Pending,
            Some("SUSPENDED") | Some("S") => Self::Suspended,
            // Transitional flag
            Some("COMPLETING") | Some("CG") => Self::Completing,
            // Successful completion
            Some("COMPLETED") | Some("CD") => Self::Completed,
            // Termination states
            Some("CANCELLED") | Some("CA") => Self::Cancelled,
            Some("FAILED") | Some("F") => Self::Failed,
            Some("TIMEOUT") | Some("TO") => Self::Timeout,
            Some("PREEMPTED") | Some("PR") => Self::Preempted,
            Some("NODE_FAIL") | Some("NF") => Self::NodeFail,
            Some("BOOT_FAIL") | Some("BF") => Self::BootFail,
            Some("DEADLINE") | Some("DL") => Self::Deadline,
            Some("OUT_OF_MEMORY") | Some("OOM") => Self::OutOfMemory,
            _ => Self::Unknown,
        }
    }

    /// True for states after which the job never transitions again.
    ///
    /// Jobs in these states are dropped from the visible table. `Preempted`
    /// is not included because a preempted job may be requeued.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Cancelled
                | Self::Failed
                | Self::Timeout
                | Self::NodeFail
                | Self::BootFail
                | Self::Deadline
                | Self::OutOfMemory
        )
    }

    /// Return the full Slurm state name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Running => "RUNNING",
            Self::Pending => "PENDING",
            Self::Suspended => "SUSPENDED",
            Self::Completing => "COMPLETING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Timeout => "TIMEOUT",
            Self::Preempted => "PREEMPTED",
            Self::NodeFail => "NODE_FAIL",
            Self::BootFail => "BOOT_FAIL",
            Self::Deadline => "DEADLINE",
            Self::OutOfMemory => "OUT_OF_MEMORY",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_state_string_full_and_short() {
        assert_eq!(JobState::from_state_string("RUNNING"), JobState::Running);
        assert_eq!(JobState::from_state_string("PD"), JobState::Pending);
        assert_eq!(JobState::from_state_string("OOM"), JobState::OutOfMemory);
        assert_eq!(JobState::from_state_string("bogus"), JobState::Unknown);
        assert_eq!(JobState::from_state_string(""), JobState::Unknown);
    }

    #[test]
    fn test_from_state_string_with_suffix() {
        assert_eq!(
            JobState::from_state_string("CANCELLED by 12345"),
            JobState::Cancelled
        );
    }

    #[test]
    fn test_from_slurm_state_skips_flags() {
        let states = vec!["REQUEUED".to_string(), "PENDING".to_string()];
        assert_eq!(JobState::from_slurm_state(&states), JobState::Pending);

        let only_flags = vec!["CONFIGURING".to_string()];
        assert_eq!(JobState::from_slurm_state(&only_flags), JobState::Unknown);

        assert_eq!(JobState::from_slurm_state(&[]), JobState::Unknown);
    }

    #[test]
    fn test_terminal_states() {
        for state in [
            JobState::Cancelled,
            JobState::Completed,
            JobState::Failed,
            JobState::Timeout,
        ] {
            assert!(state.is_terminal(), "{} should be terminal", state);
        }

        for state in [
            JobState::Running,
            JobState::Pending,
            JobState::Suspended,
            JobState::Completing,
            JobState::Preempted,
            JobState::Unknown,
        ] {
            assert!(!state.is_terminal(), "{} should not be terminal", state);
        }
    }
}
