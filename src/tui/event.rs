//! Event types for the TUI
//!
//! This module implements a dual-channel event architecture:
//! - InputEvent: Priority channel for user input (never dropped)
//! - DataEvent: Results of background work (scheduler calls, log tailing, clock)

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};

use crate::models::{JobDetails, JobRecord};
use crate::slurm::GatewayError;
use crate::tui::log_tail::LogEvent;
use crate::tui::reconcile::RefreshTicket;

/// Input events from the terminal (priority channel - never dropped)
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input
    Mouse(MouseEvent),
    /// Terminal resize
    Resize,
}

/// Why job details were requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsPurpose {
    Inspect,
    Logs,
}

/// Data and control events
#[derive(Debug)]
pub enum DataEvent {
    /// Once per second, drives the header clock and the TIME column
    ClockTick,

    /// A refresh cycle finished fetching. The ticket keeps the cycle
    /// exclusive until the snapshot has been merged.
    JobsFetched {
        ticket: RefreshTicket,
        result: Result<Vec<JobRecord>, GatewayError>,
    },

    /// `scancel` finished for these ids
    CancelFinished {
        ids: Vec<String>,
        result: Result<(), GatewayError>,
    },

    /// `scontrol show job` finished
    DetailsFetched {
        job_id: String,
        purpose: DetailsPurpose,
        result: Result<JobDetails, GatewayError>,
    },

    /// Progress of a log tail session
    Log { session: u64, event: LogEvent },
}

/// Result of processing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue running, UI needs redraw
    Continue,
    /// Continue running, no UI change needed
    Unchanged,
    /// Quit the application
    Quit,
}

/// Key action mappings for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    PageUp,
    PageDown,

    // Job commands
    ToggleSelect,
    Kill,
    Logs,
    Inspect,
    Refresh,

    // Dialogs
    Confirm,
    Deny,
    ToggleFollow,

    // UI
    ShowHelp,
    Escape,
    Quit,

    // Mouse actions
    MouseScrollUp,
    MouseScrollDown,

    // Unknown/unhandled
    Unknown,
}

impl KeyAction {
    /// Map a mouse event to an action
    pub fn from_mouse_event(event: MouseEvent) -> Self {
        use crossterm::event::MouseEventKind;

        match event.kind {
            MouseEventKind::ScrollUp => KeyAction::MouseScrollUp,
            MouseEventKind::ScrollDown => KeyAction::MouseScrollDown,
            _ => KeyAction::Unknown,
        }
    }

    /// Map a key event to an action
    pub fn from_key_event(event: KeyEvent) -> Self {
        let KeyEvent {
            code, modifiers, ..
        } = event;

        match code {
            // Ctrl+ combinations must come before bare character matches
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::PageDown,
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::PageUp,

            KeyCode::Char('q') => KeyAction::Quit,

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
            KeyCode::Char('g') | KeyCode::Home => KeyAction::MoveToTop,
            KeyCode::Char('G') | KeyCode::End => KeyAction::MoveToBottom,
            KeyCode::PageDown => KeyAction::PageDown,
            KeyCode::PageUp => KeyAction::PageUp,

            // Job commands
            KeyCode::Char(' ') => KeyAction::ToggleSelect,
            KeyCode::Char('x') => KeyAction::Kill,
            KeyCode::Char('u') => KeyAction::Logs,
            KeyCode::Char('i') => KeyAction::Inspect,
            KeyCode::Char('r') => KeyAction::Refresh,

            // Dialogs
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Confirm,
            KeyCode::Char('n') | KeyCode::Char('N') => KeyAction::Deny,
            KeyCode::Char('f') => KeyAction::ToggleFollow,

            // Help
            KeyCode::Char('?') | KeyCode::F(1) => KeyAction::ShowHelp,
            KeyCode::Esc => KeyAction::Escape,

            _ => KeyAction::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyAction {
        KeyAction::from_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_key_action_quit() {
        assert_eq!(key(KeyCode::Char('q')), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_key_action_job_commands() {
        assert_eq!(key(KeyCode::Char(' ')), KeyAction::ToggleSelect);
        assert_eq!(key(KeyCode::Char('x')), KeyAction::Kill);
        assert_eq!(key(KeyCode::Char('u')), KeyAction::Logs);
        assert_eq!(key(KeyCode::Char('i')), KeyAction::Inspect);
        assert_eq!(key(KeyCode::Char('r')), KeyAction::Refresh);
    }

    #[test]
    fn test_ctrl_u_is_page_up_not_logs() {
        let event = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(event), KeyAction::PageUp);
    }

    #[test]
    fn test_key_action_navigation() {
        assert_eq!(key(KeyCode::Char('j')), KeyAction::MoveDown);
        assert_eq!(key(KeyCode::Up), KeyAction::MoveUp);
        assert_eq!(key(KeyCode::Char('G')), KeyAction::MoveToBottom);
    }

    #[test]
    fn test_confirm_keys() {
        assert_eq!(key(KeyCode::Enter), KeyAction::Confirm);
        assert_eq!(key(KeyCode::Char('y')), KeyAction::Confirm);
        assert_eq!(key(KeyCode::Char('n')), KeyAction::Deny);
    }
}
