//! Plain-text rendering of a job snapshot for `sktop --once`

use owo_colors::OwoColorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::formatting::truncate_string;
use crate::models::JobState;
use crate::tui::app::JobRow;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "JOBID")]
    job_id: String,
    #[tabled(rename = "PARTITION")]
    partition: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "TIME")]
    time: String,
    #[tabled(rename = "NODELIST(REASON)")]
    placement: String,
}

/// Format job state with appropriate coloring
fn format_job_state(state: JobState) -> String {
    let label = state.as_str();
    match state {
        JobState::Running => label.green().to_string(),
        JobState::Pending => label.yellow().to_string(),
        JobState::Completing => label.bright_yellow().to_string(),
        JobState::Suspended => label.cyan().to_string(),
        JobState::Preempted => label.magenta().to_string(),
        _ => label.white().to_string(),
    }
}

/// Render the visible rows of a reconciled table
pub fn format_jobs(rows: &[JobRow], name_max: usize) -> String {
    if rows.is_empty() {
        return "No jobs found".yellow().to_string();
    }

    let rows: Vec<SnapshotRow> = rows
        .iter()
        .map(|row| SnapshotRow {
            job_id: row.job.id.clone(),
            partition: row.job.partition.clone(),
            name: truncate_string(&row.job.name, name_max),
            state: format_job_state(row.job.state),
            time: row.time_used.clone(),
            placement: row.placement.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobRecord, Placement};
    use crate::tui::app::{JobTable, SelectionSet};

    #[test]
    fn test_format_jobs_lists_visible_rows() {
        let now = 10_000;
        let jobs = vec![
            JobRecord {
                id: "1".into(),
                partition: "batch".into(),
                name: "prep".into(),
                state: JobState::Pending,
                start_time: 0,
                placement: Placement::Pending(Some("Resources".into())),
            },
            JobRecord {
                id: "2".into(),
                partition: "batch".into(),
                name: "train".into(),
                state: JobState::Running,
                start_time: now - 65,
                placement: Placement::Nodes("node01".into()),
            },
            JobRecord {
                id: "3".into(),
                partition: "batch".into(),
                name: "done".into(),
                state: JobState::Completed,
                start_time: 0,
                placement: Placement::Nodes("node02".into()),
            },
        ];
        let mut table = JobTable::default();
        table.reconcile(jobs, &SelectionSet::default(), now);

        let output = format_jobs(table.rows(), 30);
        assert!(output.contains("NODELIST(REASON)"));
        assert!(output.contains("(Resources)"));
        assert!(output.contains("node01"));
        assert!(output.contains("1:05"));
        assert!(!output.contains("node02"));
    }

    #[test]
    fn test_format_jobs_empty() {
        assert!(format_jobs(&[], 30).contains("No jobs found"));
    }
}
