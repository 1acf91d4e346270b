//! UI rendering for the TUI
//!
//! This module handles all rendering using ratatui. The rendering is event-driven -
//! we only render when an event triggers a state change, not at a fixed frame rate.

mod jobs;
mod logs;
mod overlays;
mod widgets;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::formatting::format_age;
use crate::tui::app::{App, ModalState};
use crate::tui::theme::Theme;

use jobs::render_jobs_view;
use logs::render_log_view;
use overlays::{render_confirm_dialog, render_help_overlay, render_inspect_view, render_toast};

/// Render the entire TUI
pub fn render(app: &App, frame: &mut Frame) {
    let theme = Theme::from_name(&app.config.display.theme);
    let area = frame.area();

    // Main layout: header, content, footer
    let layout = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(0),    // Job table
        Constraint::Length(2), // Status bar
    ])
    .split(area);

    render_header(app, frame, layout[0], &theme);
    render_jobs_view(app, frame, layout[1], &theme);
    render_status_bar(app, frame, layout[2], &theme);

    // Overlays (render in order of z-index)
    match &app.modal {
        ModalState::Help => render_help_overlay(frame, area, &theme),
        ModalState::Confirm { .. } => render_confirm_dialog(app, frame, area, &theme),
        ModalState::Inspect(view) => render_inspect_view(view, frame, area, &theme),
        ModalState::Logs(view) => render_log_view(view, frame, layout[1], &theme),
        ModalState::None => {}
    }

    // Toast (always on top)
    if let Some(toast) = app.feedback.current_toast() {
        render_toast(toast, frame, area, &theme);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = format!(" Slurm-Top (User: {})", app.username);
    let clock = format!("{} ", app.clock.format("%H:%M:%S"));

    let layout = Layout::horizontal([Constraint::Min(0), Constraint::Length(clock.len() as u16)])
        .split(area);

    let style = Style::default().bg(theme.header_bg).fg(theme.header_fg);
    frame.render_widget(Paragraph::new(title).style(style.bold()), layout[0]);
    frame.render_widget(
        Paragraph::new(clock)
            .style(style)
            .alignment(Alignment::Right),
        layout[1],
    );
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let layout = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);

    // Keybindings line - context-sensitive
    let keybinds = match &app.modal {
        ModalState::Logs(_) => " j/k:scroll  g/G:top/bottom  f:follow  Esc:close ",
        ModalState::Inspect(_) => " j/k:scroll  Esc:close ",
        ModalState::Confirm { .. } => " y/Enter:confirm  n/Esc:cancel ",
        _ => " q:quit  space:select  x:cancel  u:logs  i:inspect  r:refresh  ?:help ",
    };
    let keybind_spans: Vec<Span> = keybinds
        .split("  ")
        .flat_map(|hint| match hint.trim().split_once(':') {
            Some((key, label)) => vec![
                Span::styled(format!(" {key}"), Style::default().fg(theme.key_hint).bold()),
                Span::styled(format!(":{label} "), Style::default().fg(theme.muted)),
            ],
            None => vec![Span::raw(hint.to_string())],
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(keybind_spans)), layout[0]);

    let mut status_parts = Vec::new();

    // Jobs summary
    let (running, pending) = app.table.counts();
    status_parts.push(Span::styled(" Jobs: ", Style::default().fg(theme.muted)));
    status_parts.push(Span::styled(
        format!("{} running", running),
        Style::default().fg(theme.running),
    ));
    status_parts.push(Span::raw(", "));
    status_parts.push(Span::styled(
        format!("{} pending", pending),
        Style::default().fg(theme.pending),
    ));

    if !app.selection.is_empty() {
        status_parts.push(Span::raw(" | "));
        status_parts.push(Span::styled(
            format!("{} selected", app.selection.len()),
            Style::default().fg(theme.marked),
        ));
    }

    // Last update time
    status_parts.push(Span::raw(" | "));
    match app.timing.last_refresh {
        Some(at) => status_parts.push(Span::styled(
            format!("Updated: {} ago", format_age(at.elapsed().as_secs())),
            Style::default().fg(theme.muted),
        )),
        None => status_parts.push(Span::styled("Loading...", Style::default().fg(theme.pending))),
    }
    if !app.reconciler.is_idle() {
        status_parts.push(Span::styled(" (refreshing)", Style::default().fg(theme.muted)));
    }

    // Config warnings display (persistent until fixed)
    if let Some(first) = app.feedback.config_warnings.first() {
        let more = app.feedback.config_warnings.len() - 1;
        let warning_text = if more == 0 {
            format!(" | WARN: {}", first)
        } else {
            format!(" | WARN: {} (+{} more)", first, more)
        };
        status_parts.push(Span::styled(warning_text, Style::default().fg(theme.warning)));
    }

    // Error display (temporary, auto-dismisses)
    if let Some(error) = app.feedback.current_error() {
        status_parts.push(Span::styled(
            format!(" | ERROR: {} ", error),
            Style::default().fg(theme.error),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(status_parts)), layout[1]);
}
