//! Application state types for the TUI
//!
//! This module contains the state that is not the job table itself:
//! - Modal states (Help, Confirm, Inspect, Logs)
//! - Navigation state (ListState)
//! - Feedback state for errors, toasts and config warnings

use std::time::{Duration, Instant};

use crate::models::JobDetails;
use crate::tui::log_tail::LogView;

// ============================================================================
// Confirmation
// ============================================================================

/// Actions that need a yes/no answer before running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    CancelJobs { ids: Vec<String> },
}

impl ConfirmAction {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            ConfirmAction::CancelJobs { ids } => {
                format!("Are you sure you want to cancel {} job(s)?", ids.len())
            }
        }
    }
}

// ============================================================================
// Toasts
// ============================================================================

/// Short-lived notification shown in the bottom right corner
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub success: bool,
    pub timestamp: Instant,
}

impl Toast {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
            timestamp: Instant::now(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
            timestamp: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.timestamp.elapsed() < Duration::from_secs(3)
    }
}

// ============================================================================
// List Navigation State
// ============================================================================

/// Cursor position over a list. The renderer derives the scroll window.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub selected: usize,
}

impl ListState {
    pub fn clamp(&mut self, list_len: usize) {
        self.selected = self.selected.min(list_len.saturating_sub(1));
    }

    pub fn move_up(&mut self, list_len: usize) {
        self.page_up(list_len, 1);
    }

    pub fn move_down(&mut self, list_len: usize) {
        self.page_down(list_len, 1);
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn move_to_bottom(&mut self, list_len: usize) {
        self.selected = list_len.saturating_sub(1);
    }

    pub fn page_up(&mut self, list_len: usize, rows: usize) {
        self.selected = self.selected.saturating_sub(rows);
        self.clamp(list_len);
    }

    pub fn page_down(&mut self, list_len: usize, rows: usize) {
        self.selected = self.selected.saturating_add(rows);
        self.clamp(list_len);
    }
}

// ============================================================================
// Modal State
// ============================================================================

/// `scontrol show job` output for one job
#[derive(Debug)]
pub struct InspectView {
    pub job_id: String,
    pub details: JobDetails,
    pub scroll: usize,
}

impl InspectView {
    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll = self.scroll.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        let max = self.details.entries().len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add(amount).min(max);
    }
}

/// Modal overlay state - only one modal can be active at a time.
///
/// The log view owns its tail session, so replacing or clearing the modal
/// stops the `tail` process.
#[derive(Debug, Default)]
pub enum ModalState {
    #[default]
    None,
    Help,
    Confirm {
        action: ConfirmAction,
    },
    Inspect(InspectView),
    Logs(Box<LogView>),
}

impl ModalState {
    /// Check if any modal is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, ModalState::None)
    }

    /// Get the confirm action if in confirm mode
    #[must_use]
    pub fn confirm_action(&self) -> Option<&ConfirmAction> {
        match self {
            ModalState::Confirm { action } => Some(action),
            _ => None,
        }
    }

    /// The log view, if it is the active modal
    #[must_use]
    pub fn log_view_mut(&mut self) -> Option<&mut LogView> {
        match self {
            ModalState::Logs(view) => Some(view.as_mut()),
            _ => None,
        }
    }
}

// ============================================================================
// Feedback State
// ============================================================================

/// Unified feedback state for errors, warnings, and transient messages
#[derive(Debug)]
pub struct FeedbackState {
    last_error: Option<(String, Instant)>,
    error_display_duration: Duration,
    pub config_warnings: Vec<String>,
    toast: Option<Toast>,
}

impl FeedbackState {
    /// Create a new FeedbackState with config warnings
    pub fn new(config_warnings: Vec<String>) -> Self {
        Self {
            last_error: None,
            error_display_duration: Duration::from_secs(5),
            config_warnings,
            toast: None,
        }
    }

    /// Set an error message to display
    pub fn set_error(&mut self, msg: String) {
        self.last_error = Some((msg, Instant::now()));
    }

    /// Get the current error message if it should still be shown
    #[must_use]
    pub fn current_error(&self) -> Option<&str> {
        self.last_error
            .as_ref()
            .filter(|(_, t)| t.elapsed() < self.error_display_duration)
            .map(|(msg, _)| msg.as_str())
    }

    pub fn set_toast(&mut self, toast: Toast) {
        self.toast = Some(toast);
    }

    /// Get the current toast if visible
    #[must_use]
    pub fn current_toast(&self) -> Option<&Toast> {
        self.toast.as_ref().filter(|t| t.is_visible())
    }

    pub fn clear_toast(&mut self) {
        self.toast = None;
    }
}

// ============================================================================
// Timing State
// ============================================================================

#[derive(Debug, Default)]
pub struct TimingState {
    /// Completion of the last successful job query
    pub last_refresh: Option<Instant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_state_navigation() {
        let mut state = ListState::default();

        state.move_up(5);
        assert_eq!(state.selected, 0);

        state.move_down(5);
        assert_eq!(state.selected, 1);

        state.move_to_bottom(5);
        assert_eq!(state.selected, 4);

        state.move_to_top();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_list_state_clamp_after_shrink() {
        let mut state = ListState { selected: 8 };
        state.clamp(3);
        assert_eq!(state.selected, 2);

        state.clamp(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_list_state_paging() {
        let mut state = ListState::default();
        state.page_down(30, 10);
        assert_eq!(state.selected, 10);
        state.page_down(12, 10);
        assert_eq!(state.selected, 11);
        state.page_up(12, 10);
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn test_confirm_description() {
        let action = ConfirmAction::CancelJobs {
            ids: vec!["1".into(), "2".into()],
        };
        assert_eq!(action.description(), "Are you sure you want to cancel 2 job(s)?");
    }

    #[test]
    fn test_modal_state() {
        assert!(!ModalState::None.is_active());
        assert!(ModalState::Help.is_active());
        assert!(ModalState::Help.confirm_action().is_none());
        let confirm = ModalState::Confirm {
            action: ConfirmAction::CancelJobs { ids: vec!["7".into()] },
        };
        assert!(confirm.is_active());
        assert!(confirm.confirm_action().is_some());
    }

    #[test]
    fn test_feedback_toast_and_error() {
        let mut feedback = FeedbackState::new(vec!["bad theme".into()]);
        assert!(feedback.current_toast().is_none());
        assert!(feedback.current_error().is_none());

        feedback.set_toast(Toast::success("Cancelled 1 job(s).".into()));
        feedback.set_error("Failed to cancel 1 job(s).".into());
        assert_eq!(
            feedback.current_toast().map(|t| t.message.as_str()),
            Some("Cancelled 1 job(s).")
        );
        assert_eq!(feedback.current_error(), Some("Failed to cancel 1 job(s)."));

        feedback.clear_toast();
        assert!(feedback.current_toast().is_none());
        assert_eq!(feedback.config_warnings.len(), 1);
    }

    #[test]
    fn test_inspect_scroll_bounds() {
        let mut view = InspectView {
            job_id: "1".into(),
            details: JobDetails::parse("A=1 B=2 C=3").unwrap(),
            scroll: 0,
        };
        view.scroll_down(10);
        assert_eq!(view.scroll, 2);
        view.scroll_up(5);
        assert_eq!(view.scroll, 0);
    }
}
