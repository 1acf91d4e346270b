//! Application state and core logic for the TUI
//!
//! This module contains the main App struct and all associated state management.
//! The architecture follows a TEA-inspired pattern with mutable state and method-based updates.

// Submodules
mod commands;
mod state;
mod table;

// Re-export public types
pub use state::{
    ConfirmAction, FeedbackState, InspectView, ModalState, TimingState, Toast,
};
pub use table::{JobRow, JobTable, SelectionSet};

use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use tokio::sync::mpsc;

use crate::models::TuiConfig;
use crate::slurm::SlurmInterface;
use crate::tui::event::{DataEvent, DetailsPurpose, EventResult, InputEvent, KeyAction};
use crate::tui::log_tail::LogView;
use crate::tui::reconcile::{Reconciler, RefreshCause};

/// Lines moved by one page in the inspect and log views
const VIEW_PAGE: usize = 10;
/// Lines moved by one mouse wheel step in the inspect and log views
const WHEEL_STEP: usize = 3;

/// Main application state
///
/// Owned by the event loop. Background tasks never touch it directly; they
/// report through `data_tx` and the loop applies results in `handle_data`.
pub struct App {
    // Lifecycle
    pub running: bool,

    // Modal State
    pub modal: ModalState,

    // Jobs
    pub table: JobTable,
    pub selection: SelectionSet,

    // User Context
    pub username: String,

    pub feedback: FeedbackState,
    pub timing: TimingState,
    /// Wall clock shown in the header, advanced by clock ticks
    pub clock: DateTime<Local>,

    // Configuration
    pub config: TuiConfig,

    // Scheduler access
    pub slurm: SlurmInterface,
    pub reconciler: Reconciler,

    // Communication
    pub data_tx: mpsc::Sender<DataEvent>,

    next_log_session: u64,
}

impl App {
    /// Create the app. `data_tx` receives the results of every background task.
    pub fn new(
        config: TuiConfig,
        config_warnings: Vec<String>,
        username: String,
        slurm: SlurmInterface,
        data_tx: mpsc::Sender<DataEvent>,
    ) -> Self {
        let reconciler = Reconciler::new(slurm.clone(), username.clone(), data_tx.clone());

        Self {
            running: true,
            modal: ModalState::None,
            table: JobTable::default(),
            selection: SelectionSet::default(),
            username,
            feedback: FeedbackState::new(config_warnings),
            timing: TimingState::default(),
            clock: Local::now(),
            config,
            slurm,
            reconciler,
            data_tx,
            next_log_session: 0,
        }
    }

    /// Current time in epoch seconds, for the TIME column
    #[must_use]
    pub fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    /// Handle an input event
    pub fn handle_input(&mut self, event: InputEvent) -> EventResult {
        match event {
            InputEvent::Key(key_event) => {
                let action = KeyAction::from_key_event(key_event);
                self.handle_action(action)
            }
            InputEvent::Resize => EventResult::Continue,
            InputEvent::Mouse(mouse_event) => {
                let action = KeyAction::from_mouse_event(mouse_event);
                self.handle_action(action)
            }
        }
    }

    /// Handle a key action
    fn handle_action(&mut self, action: KeyAction) -> EventResult {
        // Help overlay takes priority
        if matches!(self.modal, ModalState::Help) {
            match action {
                KeyAction::Escape | KeyAction::ShowHelp | KeyAction::Quit => {
                    self.modal = ModalState::None;
                    return EventResult::Continue;
                }
                _ => return EventResult::Unchanged,
            }
        }

        // Modal modes take priority over normal navigation
        match &self.modal {
            ModalState::Confirm { .. } => return self.handle_confirm_action(action),
            ModalState::Inspect(_) => return self.handle_inspect_action(action),
            ModalState::Logs(_) => return self.handle_logs_action(action),
            _ => {}
        }

        if let Some(result) = self.handle_navigation(&action) {
            return result;
        }

        match action {
            KeyAction::Quit => {
                self.running = false;
                EventResult::Quit
            }
            KeyAction::ToggleSelect => self.toggle_select(),
            KeyAction::Kill => self.request_cancel(),
            KeyAction::Inspect => self.request_details(DetailsPurpose::Inspect),
            KeyAction::Logs => self.request_details(DetailsPurpose::Logs),
            KeyAction::Refresh => {
                if self.reconciler.trigger(RefreshCause::Manual) {
                    EventResult::Continue
                } else {
                    EventResult::Unchanged
                }
            }
            KeyAction::ShowHelp => {
                self.modal = ModalState::Help;
                EventResult::Continue
            }
            KeyAction::Escape if self.feedback.current_toast().is_some() => {
                self.feedback.clear_toast();
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    /// Handle navigation actions (returns Some if action was handled)
    fn handle_navigation(&mut self, action: &KeyAction) -> Option<EventResult> {
        let len = self.table.len();
        let list = &mut self.table.list_state;
        match action {
            KeyAction::MoveUp | KeyAction::MouseScrollUp => list.move_up(len),
            KeyAction::MoveDown | KeyAction::MouseScrollDown => list.move_down(len),
            KeyAction::MoveToTop => list.move_to_top(),
            KeyAction::MoveToBottom => list.move_to_bottom(len),
            KeyAction::PageUp => list.page_up(len, VIEW_PAGE),
            KeyAction::PageDown => list.page_down(len, VIEW_PAGE),
            _ => return None,
        }
        Some(EventResult::Continue)
    }

    /// Handle actions in confirm dialog mode
    fn handle_confirm_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Confirm => {
                if let ModalState::Confirm { action } = std::mem::take(&mut self.modal) {
                    match action {
                        ConfirmAction::CancelJobs { ids } => self.execute_cancel(ids),
                    }
                }
                EventResult::Continue
            }
            KeyAction::Deny | KeyAction::Escape | KeyAction::Quit => {
                self.modal = ModalState::None;
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    /// Handle actions while the inspect view is open
    fn handle_inspect_action(&mut self, action: KeyAction) -> EventResult {
        let ModalState::Inspect(view) = &mut self.modal else {
            return EventResult::Unchanged;
        };

        match action {
            KeyAction::Escape | KeyAction::Quit | KeyAction::Inspect => {
                self.modal = ModalState::None;
            }
            KeyAction::MoveUp => view.scroll_up(1),
            KeyAction::MoveDown => view.scroll_down(1),
            KeyAction::MouseScrollUp => view.scroll_up(WHEEL_STEP),
            KeyAction::MouseScrollDown => view.scroll_down(WHEEL_STEP),
            KeyAction::PageUp => view.scroll_up(VIEW_PAGE),
            KeyAction::PageDown => view.scroll_down(VIEW_PAGE),
            KeyAction::MoveToTop => view.scroll = 0,
            KeyAction::MoveToBottom => view.scroll_down(usize::MAX),
            _ => return EventResult::Unchanged,
        }
        EventResult::Continue
    }

    /// Handle actions while the log view is open. Leaving the view drops the
    /// session, which stops `tail`.
    fn handle_logs_action(&mut self, action: KeyAction) -> EventResult {
        let ModalState::Logs(view) = &mut self.modal else {
            return EventResult::Unchanged;
        };

        match action {
            KeyAction::Escape | KeyAction::Quit | KeyAction::Logs => {
                view.session.close();
                self.modal = ModalState::None;
            }
            KeyAction::MoveUp => view.scroll_up(1),
            KeyAction::MoveDown => view.scroll_down(1),
            KeyAction::MouseScrollUp => view.scroll_up(WHEEL_STEP),
            KeyAction::MouseScrollDown => view.scroll_down(WHEEL_STEP),
            KeyAction::PageUp => view.scroll_up(VIEW_PAGE),
            KeyAction::PageDown => view.scroll_down(VIEW_PAGE),
            KeyAction::MoveToTop => view.scroll_to_top(),
            KeyAction::MoveToBottom => view.scroll_to_bottom(),
            KeyAction::ToggleFollow => view.toggle_follow(),
            _ => return EventResult::Unchanged,
        }
        EventResult::Continue
    }

    /// Handle a data event
    pub fn handle_data(&mut self, event: DataEvent) -> EventResult {
        match event {
            DataEvent::ClockTick => {
                self.clock = Local::now();
                let now = self.now();
                if self.table.rows().iter().any(|row| row.job.is_running()) {
                    self.table.rebuild(&self.selection, now);
                }
                EventResult::Continue
            }
            DataEvent::JobsFetched { ticket, result } => {
                let jobs = match result {
                    Ok(jobs) => {
                        self.timing.last_refresh = Some(Instant::now());
                        jobs
                    }
                    // Already logged by the gateway; an unreachable scheduler shows an empty table
                    Err(_) => Vec::new(),
                };
                let now = self.now();
                self.table.reconcile(jobs, &self.selection, now);
                tracing::debug!(cause = ?ticket.cause(), rows = self.table.len(), "snapshot merged");
                drop(ticket);
                EventResult::Continue
            }
            DataEvent::CancelFinished { ids, result } => self.finish_cancel(ids, result),
            DataEvent::DetailsFetched {
                job_id,
                purpose,
                result,
            } => self.finish_details(job_id, purpose, result),
            DataEvent::Log { session, event } => match self.modal.log_view_mut() {
                Some(view) if view.session.id() == session => {
                    view.apply(event);
                    EventResult::Continue
                }
                // Output from a session that has already been dismissed
                _ => EventResult::Unchanged,
            },
        }
    }

    /// Take the log session out of the app so it can be shut down cleanly
    pub fn take_log_view(&mut self) -> Option<Box<LogView>> {
        match std::mem::take(&mut self.modal) {
            ModalState::Logs(view) => Some(view),
            other => {
                self.modal = other;
                None
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::slurm::GatewayError;
    use crate::slurm::test_support::{fake_tool, scratch_dir};
    use crate::tui::log_tail::LogEvent;

    const JOBS: &str = r#"{"jobs": [
        {"job_id": 1, "partition": "gpu", "name": "train", "job_state": "PENDING",
         "start_time": 0, "nodes": "", "job_reason": "Resources"},
        {"job_id": 2, "partition": "cpu", "name": "sim", "job_state": "RUNNING",
         "start_time": 1700000000, "nodes": "node01", "job_reason": ""}
    ], "errors": []}"#;

    fn press(app: &mut App, code: KeyCode) -> EventResult {
        app.handle_input(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    async fn next_event(rx: &mut mpsc::Receiver<DataEvent>) -> DataEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for data event")
            .expect("channel closed")
    }

    /// App wired to fake Slurm tools, with the initial load already merged
    async fn loaded_app(name: &str, scancel_body: &str) -> (App, mpsc::Receiver<DataEvent>) {
        let dir = scratch_dir(name);
        fake_tool(&dir, "squeue", &format!("cat <<'EOF'\n{JOBS}\nEOF"));
        fake_tool(&dir, "scancel", scancel_body);
        fake_tool(
            &dir,
            "scontrol",
            &format!("echo \"JobId=$3 JobName=sim StdOut={}/job.out\"", dir.display()),
        );

        let (tx, mut rx) = mpsc::channel(32);
        let mut app = App::new(
            TuiConfig::default(),
            Vec::new(),
            "alice".into(),
            SlurmInterface::at(&dir),
            tx,
        );
        assert!(app.reconciler.trigger(RefreshCause::Timer));
        let event = next_event(&mut rx).await;
        app.handle_data(event);
        (app, rx)
    }

    #[tokio::test]
    async fn test_initial_load_populates_table() {
        let (app, _rx) = loaded_app("app-load", "exit 0").await;
        assert_eq!(app.table.len(), 2);
        assert_eq!(app.table.current_id(), Some("1"));
        assert!(app.reconciler.is_idle());
        assert!(app.timing.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_failed_poll_empties_table_until_next_success() {
        let (mut app, mut rx) = loaded_app("app-poll-fail", "exit 0").await;
        let last_refresh = app.timing.last_refresh;

        assert!(app.reconciler.trigger(RefreshCause::Manual));
        let DataEvent::JobsFetched { ticket, .. } = next_event(&mut rx).await else {
            panic!("expected a job snapshot");
        };
        app.handle_data(DataEvent::JobsFetched {
            ticket,
            result: Err(GatewayError::NonZeroExit {
                command: "squeue".into(),
                code: 1,
                stderr: "slurm_load_jobs error: Unable to contact slurm controller".into(),
            }),
        });
        assert!(app.table.is_empty());
        assert_eq!(app.table.current_id(), None);
        assert_eq!(app.timing.last_refresh, last_refresh);
        assert!(app.reconciler.is_idle());

        assert!(app.reconciler.trigger(RefreshCause::Timer));
        let event = next_event(&mut rx).await;
        app.handle_data(event);
        assert_eq!(app.table.len(), 2);
        assert_eq!(app.table.current_id(), Some("1"));
        assert!(app.timing.last_refresh > last_refresh);
    }

    #[tokio::test]
    async fn test_cancel_selection_then_forced_refresh() {
        let (mut app, mut rx) = loaded_app("app-cancel", "exit 0").await;

        press(&mut app, KeyCode::Char(' '));
        assert!(app.selection.contains("1"));
        assert!(app.table.rows()[0].selected);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(
            app.modal.confirm_action(),
            Some(&ConfirmAction::CancelJobs {
                ids: vec!["1".into()]
            })
        );

        press(&mut app, KeyCode::Char('y'));
        assert!(!app.modal.is_active());

        let event = next_event(&mut rx).await;
        assert!(matches!(event, DataEvent::CancelFinished { .. }));
        app.handle_data(event);
        assert!(app.selection.is_empty());
        assert_eq!(
            app.feedback.current_toast().map(|t| t.message.as_str()),
            Some("Cancelled 1 job(s).")
        );

        match next_event(&mut rx).await {
            DataEvent::JobsFetched { ticket, result } => {
                assert_eq!(ticket.cause(), RefreshCause::Forced);
                app.handle_data(DataEvent::JobsFetched { ticket, result });
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(app.reconciler.is_idle());
    }

    #[tokio::test]
    async fn test_failed_cancel_keeps_selection() {
        let (mut app, mut rx) = loaded_app("app-cancel-fail", "exit 1").await;

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Enter);

        let event = next_event(&mut rx).await;
        app.handle_data(event);

        assert!(app.selection.contains("1"));
        assert_eq!(
            app.feedback.current_toast().map(|t| t.message.as_str()),
            Some("Failed to cancel 1 job(s).")
        );
        assert!(app.feedback.current_error().is_some());
        assert!(app.reconciler.is_idle());
    }

    #[tokio::test]
    async fn test_cancel_without_selection_targets_cursor() {
        let (mut app, _rx) = loaded_app("app-cancel-cursor", "exit 0").await;
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.cancel_targets(), vec!["2".to_string()]);

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.modal.is_active());
    }

    #[tokio::test]
    async fn test_kill_on_empty_table_is_noop() {
        let (tx, _rx) = mpsc::channel(4);
        let mut app = App::new(
            TuiConfig::default(),
            Vec::new(),
            "alice".into(),
            SlurmInterface::at(&scratch_dir("app-empty")),
            tx,
        );
        assert_eq!(press(&mut app, KeyCode::Char('x')), EventResult::Unchanged);
        assert!(!app.modal.is_active());
    }

    #[tokio::test]
    async fn test_inspect_opens_details() {
        let (mut app, mut rx) = loaded_app("app-inspect", "exit 0").await;
        press(&mut app, KeyCode::Char('i'));

        let event = next_event(&mut rx).await;
        app.handle_data(event);
        match &app.modal {
            ModalState::Inspect(view) => {
                assert_eq!(view.job_id, "1");
                assert_eq!(view.details.job_name(), Some("sim"));
            }
            other => panic!("unexpected modal: {other:?}"),
        }

        press(&mut app, KeyCode::Esc);
        assert!(!app.modal.is_active());
    }

    #[tokio::test]
    async fn test_logs_view_lifecycle() {
        let (mut app, mut rx) = loaded_app("app-logs", "exit 0").await;
        press(&mut app, KeyCode::Char('u'));

        let event = next_event(&mut rx).await;
        app.handle_data(event);
        let session = match &app.modal {
            ModalState::Logs(view) => {
                assert!(view.title().starts_with("Logs for Job 1: "));
                view.session.id()
            }
            other => panic!("unexpected modal: {other:?}"),
        };

        // The output file does not exist in the scratch dir
        let event = next_event(&mut rx).await;
        app.handle_data(event);
        if let ModalState::Logs(view) = &app.modal {
            assert_eq!(view.lines.back().map(String::as_str), Some("Log file not found yet."));
        }

        press(&mut app, KeyCode::Esc);
        assert!(!app.modal.is_active());

        // Late output from the dismissed session is ignored
        let stale = DataEvent::Log {
            session,
            event: LogEvent::Lines(vec!["late".into()]),
        };
        assert_eq!(app.handle_data(stale), EventResult::Unchanged);
    }

    #[tokio::test]
    async fn test_manual_refresh_is_noop_while_busy() {
        let (mut app, _rx) = loaded_app("app-refresh", "exit 0").await;
        assert_eq!(press(&mut app, KeyCode::Char('r')), EventResult::Continue);
        assert_eq!(press(&mut app, KeyCode::Char('r')), EventResult::Unchanged);
    }

    #[tokio::test]
    async fn test_help_and_quit() {
        let (mut app, _rx) = loaded_app("app-help", "exit 0").await;
        press(&mut app, KeyCode::Char('?'));
        assert!(matches!(app.modal, ModalState::Help));
        press(&mut app, KeyCode::Esc);
        assert!(!app.modal.is_active());

        assert_eq!(press(&mut app, KeyCode::Char('q')), EventResult::Quit);
        assert!(!app.running);
    }
}
