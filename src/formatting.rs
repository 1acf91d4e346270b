//! Shared formatting utilities used by both the TUI and `--once` output
//!
//! String truncation and the Slurm-style elapsed time shown in the TIME column.

use crate::models::JobState;

/// Truncate a string to a maximum length (in characters), adding "..." at the end if truncated.
///
/// This function is Unicode-safe and counts characters, not bytes.
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        // Edge case: if max_len is very small, just truncate without ellipsis
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format elapsed seconds the way `squeue` prints TIME: `D-HH:MM:SS`, `H:MM:SS` or `M:SS`.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Time used by a job at `now` (epoch seconds).
///
/// Only running jobs accumulate time; everything else shows `0:00`. A start
/// time in the future (clock skew) clamps to zero.
#[must_use]
pub fn format_time_used(start_time: i64, state: JobState, now: i64) -> String {
    if state != JobState::Running {
        return "0:00".to_string();
    }
    let elapsed = now.saturating_sub(start_time).max(0) as u64;
    format_elapsed(elapsed)
}

/// Compact age for the status bar ("12s", "3m", "2h")
#[must_use]
pub fn format_age(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}h", seconds / 3600)
    }
}
