//! The job table and the selection set
//!
//! Rows are rebuilt from scratch on every merged snapshot. The selection set
//! and the cursor survive refreshes by job id, never by row position.

use std::collections::HashSet;

use crate::models::{JobRecord, JobState};

use super::state::ListState;

/// Job ids marked for batch actions. Ids of jobs that have left the queue
/// stay in the set until it is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(HashSet<String>);

impl SelectionSet {
    /// Add or remove `id`; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Selected ids in a stable order
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.0.iter().cloned().collect();
        ids.sort();
        ids
    }
}

/// One rendered line of the job table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub job: JobRecord,
    pub selected: bool,
    pub time_used: String,
    pub placement: String,
}

impl JobRow {
    fn build(job: &JobRecord, selection: &SelectionSet, now: i64) -> Self {
        Self {
            selected: selection.contains(&job.id),
            time_used: job.time_used(now),
            placement: job.placement.display(),
            job: job.clone(),
        }
    }
}

/// Latest non-terminal jobs plus the cursor over them
#[derive(Debug, Default)]
pub struct JobTable {
    snapshot: Vec<JobRecord>,
    rows: Vec<JobRow>,
    pub list_state: ListState,
}

impl JobTable {
    /// Merge a fresh snapshot, keeping the cursor on the same job id when it
    /// is still present and falling back to the first row otherwise.
    pub fn reconcile(&mut self, jobs: Vec<JobRecord>, selection: &SelectionSet, now: i64) {
        let cursor_id = self.current_id().map(str::to_string);

        self.snapshot = jobs
            .into_iter()
            .filter(|job| !job.state.is_terminal())
            .collect();
        self.rebuild(selection, now);

        match cursor_id.and_then(|id| self.rows.iter().position(|row| row.job.id == id)) {
            Some(index) => self.list_state.selected = index,
            None => self.list_state.move_to_top(),
        }
        self.list_state.clamp(self.rows.len());
    }

    /// Recompute rows from the current snapshot (selection marks and TIME)
    pub fn rebuild(&mut self, selection: &SelectionSet, now: i64) {
        self.rows = self
            .snapshot
            .iter()
            .map(|job| JobRow::build(job, selection, now))
            .collect();
        self.list_state.clamp(self.rows.len());
    }

    #[must_use]
    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row under the cursor
    #[must_use]
    pub fn current(&self) -> Option<&JobRow> {
        self.rows.get(self.list_state.selected)
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current().map(|row| row.job.id.as_str())
    }

    /// (running, pending) counts for the status bar
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        self.rows.iter().fold((0, 0), |(running, pending), row| match row.job.state {
            JobState::Running => (running + 1, pending),
            JobState::Pending => (running, pending + 1),
            _ => (running, pending),
        })
    }
}
