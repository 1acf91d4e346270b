//! Terminal User Interface for sktop
//!
//! This module provides the interactive job dashboard.
//! It features:
//! - Periodic job polling with cursor and selection continuity
//! - Dual-channel event architecture (priority input, backpressure-aware data)
//! - Cancel, inspect and log-follow actions on the selected jobs
//! - Graceful degradation when the scheduler is unavailable

pub mod app;
pub mod event;
pub mod log_tail;
pub mod reconcile;
pub mod runtime;
pub mod theme;
pub mod ui;

use std::io::{self, IsTerminal, stdout};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::models::TuiConfig;
use crate::slurm::SlurmInterface;
use crate::tui::app::App;
use crate::tui::reconcile::spawn_refresh_timer;
use crate::tui::runtime::{
    TuiRuntime, create_channels, run_event_loop, spawn_clock_tick, spawn_input_task,
};

/// Terminal capability requirements for TUI mode
#[derive(Debug)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub term_type: String,
    pub supports_alternate_screen: bool,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities
    pub fn detect() -> Self {
        let term_type = std::env::var("TERM").unwrap_or_default();
        Self::from_parts(stdout().is_terminal(), term_type)
    }

    fn from_parts(is_tty: bool, term_type: String) -> Self {
        // Known problematic terminals
        let supports_alternate_screen = !matches!(term_type.as_str(), "dumb" | "" | "unknown");

        Self {
            is_tty,
            term_type,
            supports_alternate_screen,
        }
    }

    /// Check if terminal is suitable for TUI mode
    pub fn is_suitable(&self) -> bool {
        self.is_tty && self.supports_alternate_screen
    }

    /// Get error message for unsuitable terminal
    pub fn error_message(&self) -> String {
        if !self.is_tty {
            "TUI mode requires an interactive terminal (stdout is not a TTY).\n\
             Hint: Use 'sktop --once' to print a single snapshot instead."
                .to_string()
        } else if !self.supports_alternate_screen {
            format!(
                "Terminal type '{}' may not support TUI mode.\n\
                 Hint: Set TERM to a supported value (e.g., xterm-256color) or use 'sktop --once'.",
                if self.term_type.is_empty() {
                    "(unset)"
                } else {
                    &self.term_type
                }
            )
        } else {
            "Unknown terminal capability issue.".to_string()
        }
    }
}

/// Run the TUI application
async fn run_tui(
    config: TuiConfig,
    mut warnings: Vec<String>,
    username: String,
    slurm: SlurmInterface,
) -> Result<()> {
    // Check terminal capabilities before attempting TUI mode
    let capabilities = TerminalCapabilities::detect();
    if !capabilities.is_suitable() {
        bail!("{}", capabilities.error_message());
    }

    // Problems reaching Slurm are shown in the status bar, not fatal
    if slurm.is_unverified_fallback() {
        warnings.push(format!(
            "squeue not found in PATH, falling back to {}",
            slurm.slurm_bin_path.display()
        ));
    }
    if let Err(e) = slurm.test_connection().await {
        tracing::error!(error = %e, "slurm connection test failed");
        warnings.push(e);
    }

    let refresh_period = Duration::try_from_secs_f64(config.refresh.interval)
        .context("invalid refresh interval")?;

    let mut terminal = setup_terminal().context("failed to initialize terminal")?;

    let (input_tx, input_rx, data_tx, data_rx) = create_channels();
    let app = App::new(config, warnings, username, slurm, data_tx.clone());

    let mut runtime = TuiRuntime::new();
    runtime.track(spawn_input_task(input_tx, runtime.cancel_token()));
    runtime.track(spawn_clock_tick(data_tx, runtime.cancel_token()));
    runtime.track(spawn_refresh_timer(
        app.reconciler.clone(),
        refresh_period,
        runtime.cancel_token(),
    ));

    let result = run_event_loop(app, input_rx, data_rx, |app| {
        terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    })
    .await;

    // Shutdown background tasks
    runtime.shutdown().await;

    // Restore terminal even when the loop failed
    restore_terminal(&mut terminal)?;

    result
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI with the tokio runtime (entry point from main)
pub fn run(
    config: TuiConfig,
    warnings: Vec<String>,
    username: String,
    slurm: SlurmInterface,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(run_tui(config, warnings, username, slurm))
}
