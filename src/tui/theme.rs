//! Theme definitions for the TUI
//!
//! This module provides colorblind-safe themes for both dark and light terminals.
//! The default is "dark" but users can configure "light" via config file or env var.

use ratatui::style::Color;

use crate::models::JobState;

/// Available theme names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    /// Parse a configured theme name; anything unrecognised is dark
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "light" => ThemeName::Light,
            _ => ThemeName::Dark,
        }
    }
}

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,

    // Base colors
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub border_focused: Color,

    // Job state colors (colorblind-safe)
    pub running: Color,
    pub pending: Color,
    pub completed: Color,
    pub failed: Color,
    pub cancelled: Color,
    pub timeout: Color,

    // Selection marks and the cursor row
    pub marked: Color,
    pub cursor_bg: Color,
    pub cursor_fg: Color,

    // Header and status bars
    pub header_bg: Color,
    pub header_fg: Color,
    pub title: Color,
    pub key_hint: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme (default)
    pub fn dark() -> Self {
        Self {
            name: ThemeName::Dark,

            fg: Color::White,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            running: Color::Rgb(0, 200, 0),      // Bright green
            pending: Color::Rgb(255, 180, 0),    // Orange (not yellow - better visibility)
            completed: Color::Rgb(80, 160, 255), // Light blue
            failed: Color::Rgb(255, 80, 80),     // Bright red
            cancelled: Color::DarkGray,
            timeout: Color::Magenta,

            marked: Color::Rgb(0, 200, 0),
            cursor_bg: Color::Rgb(60, 60, 80),
            cursor_fg: Color::White,

            header_bg: Color::Rgb(40, 80, 120),
            header_fg: Color::White,
            title: Color::Cyan,
            key_hint: Color::Cyan,
            warning: Color::Rgb(255, 180, 0),
            error: Color::Rgb(255, 100, 100),
        }
    }

    /// Create a light theme
    /// Uses darker, more saturated colors for visibility on light backgrounds
    pub fn light() -> Self {
        Self {
            name: ThemeName::Light,

            fg: Color::Black,
            muted: Color::Rgb(120, 120, 120),
            border: Color::Rgb(120, 120, 120),
            border_focused: Color::Rgb(0, 100, 180),

            running: Color::Rgb(0, 140, 0),       // Dark green
            pending: Color::Rgb(200, 120, 0),     // Dark orange
            completed: Color::Rgb(0, 80, 180),    // Dark blue
            failed: Color::Rgb(200, 0, 0),        // Dark red
            cancelled: Color::Rgb(100, 100, 100), // Medium gray
            timeout: Color::Rgb(160, 0, 160),     // Dark magenta

            marked: Color::Rgb(0, 140, 0),
            cursor_bg: Color::Rgb(200, 220, 255),
            cursor_fg: Color::Black,

            header_bg: Color::Rgb(180, 200, 230),
            header_fg: Color::Black,
            title: Color::Rgb(0, 100, 180),
            key_hint: Color::Rgb(0, 100, 180),
            warning: Color::Rgb(200, 120, 0),
            error: Color::Rgb(200, 0, 0),
        }
    }

    /// Create theme from name string
    pub fn from_name(name: &str) -> Self {
        match ThemeName::parse(name) {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    /// Get color for a job state
    pub fn job_state_color(&self, state: JobState) -> Color {
        match state {
            JobState::Running | JobState::Completing => self.running,
            JobState::Pending | JobState::Suspended => self.pending,
            JobState::Completed => self.completed,
            JobState::Failed
            | JobState::OutOfMemory
            | JobState::NodeFail
            | JobState::BootFail => self.failed,
            JobState::Cancelled | JobState::Preempted => self.cancelled,
            JobState::Timeout | JobState::Deadline => self.timeout,
            JobState::Unknown => self.fg,
        }
    }
}
