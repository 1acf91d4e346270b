//! Job commands: select, cancel, inspect and logs
//!
//! Scheduler calls never run on the event loop. Each command spawns a task
//! that reports back through the data channel, and the matching
//! `finish_*` method applies the result.

use crate::models::JobDetails;
use crate::slurm::GatewayError;
use crate::tui::event::{DataEvent, DetailsPurpose, EventResult};
use crate::tui::log_tail::{LogTailSession, LogView, resolve_log_path};

use super::App;
use super::state::{ConfirmAction, InspectView, ModalState, Toast};

impl App {
    /// Toggle the job under the cursor in the selection set
    pub(super) fn toggle_select(&mut self) -> EventResult {
        let Some(id) = self.table.current_id().map(str::to_string) else {
            return EventResult::Unchanged;
        };
        self.selection.toggle(&id);
        self.table.rebuild(&self.selection, self.now());
        EventResult::Continue
    }

    /// Ids a cancel would act on: the selection, else the job under the cursor
    #[must_use]
    pub fn cancel_targets(&self) -> Vec<String> {
        if self.selection.is_empty() {
            self.table
                .current_id()
                .map(|id| vec![id.to_string()])
                .unwrap_or_default()
        } else {
            self.selection.ids()
        }
    }

    /// Ask for confirmation (or cancel straight away when configured to)
    pub(super) fn request_cancel(&mut self) -> EventResult {
        let ids = self.cancel_targets();
        if ids.is_empty() {
            return EventResult::Unchanged;
        }

        if self.config.behavior.confirm_cancel {
            self.modal = ModalState::Confirm {
                action: ConfirmAction::CancelJobs { ids },
            };
        } else {
            self.execute_cancel(ids);
        }
        EventResult::Continue
    }

    /// Run `scancel` for `ids` in the background
    pub(super) fn execute_cancel(&mut self, ids: Vec<String>) {
        self.feedback.set_toast(Toast::success(format!(
            "Cancelling {} job(s)...",
            ids.len()
        )));

        let slurm = self.slurm.clone();
        let data_tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = slurm.cancel(&ids).await;
            let _ = data_tx.send(DataEvent::CancelFinished { ids, result }).await;
        });
    }

    pub(super) fn finish_cancel(
        &mut self,
        ids: Vec<String>,
        result: Result<(), GatewayError>,
    ) -> EventResult {
        match result {
            Ok(()) => {
                tracing::info!(job_ids = ?ids, "jobs cancelled");
                self.selection.clear();
                self.table.rebuild(&self.selection, self.now());
                self.feedback
                    .set_toast(Toast::success(format!("Cancelled {} job(s).", ids.len())));
                self.reconciler.force();
            }
            Err(e) => {
                self.feedback
                    .set_toast(Toast::failure(format!("Failed to cancel {} job(s).", ids.len())));
                self.feedback.set_error(format!("scancel: {e}"));
            }
        }
        EventResult::Continue
    }

    /// Fetch `scontrol show job` for the job under the cursor
    pub(super) fn request_details(&mut self, purpose: DetailsPurpose) -> EventResult {
        let Some(job_id) = self.table.current_id().map(str::to_string) else {
            return EventResult::Unchanged;
        };

        let slurm = self.slurm.clone();
        let data_tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = slurm.fetch_details(&job_id).await;
            let _ = data_tx
                .send(DataEvent::DetailsFetched {
                    job_id,
                    purpose,
                    result,
                })
                .await;
        });
        EventResult::Unchanged
    }

    /// Open the inspect or log view once details have arrived.
    ///
    /// A failed detail query degrades to empty details: inspect shows an
    /// empty record and the log view falls back to the default output path.
    pub(super) fn finish_details(
        &mut self,
        job_id: String,
        purpose: DetailsPurpose,
        result: Result<JobDetails, GatewayError>,
    ) -> EventResult {
        // Another view was opened in the meantime
        if self.modal.is_active() {
            return EventResult::Unchanged;
        }

        let details = result.unwrap_or_default();
        match purpose {
            DetailsPurpose::Inspect => {
                self.modal = ModalState::Inspect(InspectView {
                    job_id,
                    details,
                    scroll: 0,
                });
            }
            DetailsPurpose::Logs => self.open_logs(job_id, &details),
        }
        EventResult::Continue
    }

    fn open_logs(&mut self, job_id: String, details: &JobDetails) {
        let log_path = resolve_log_path(&job_id, details);
        self.next_log_session += 1;
        let session = LogTailSession::start(
            self.next_log_session,
            job_id,
            log_path,
            self.config.logs.initial_lines,
            self.data_tx.clone(),
        );
        self.modal = ModalState::Logs(Box::new(LogView::new(
            session,
            self.config.logs.max_lines,
        )));
    }
}
