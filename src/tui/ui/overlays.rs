//! Overlay and popup rendering
//!
//! Handles rendering of help, the confirm dialog, the inspect view and toast notifications.

use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::tui::app::{App, InspectView, Toast};
use crate::tui::theme::Theme;

use super::widgets::{centered_rect, popup_block};

pub fn render_help_overlay(frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(60, 80, area);

    // Clear the area first
    frame.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(theme.title).bold(),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "sktop - Keyboard Shortcuts",
            Style::default().bold(),
        )),
        Line::from(""),
        section("Navigation"),
        Line::from("  j / Down       Move cursor down"),
        Line::from("  k / Up         Move cursor up"),
        Line::from("  g / Home       Jump to top"),
        Line::from("  G / End        Jump to bottom"),
        Line::from("  Ctrl+d / PgDn  Page down"),
        Line::from("  Ctrl+u / PgUp  Page up"),
        Line::from("  Scroll wheel   Move cursor"),
        Line::from(""),
        section("Jobs"),
        Line::from("  Space          Select / deselect job"),
        Line::from("  x              Cancel selected jobs (or the job under the cursor)"),
        Line::from("  i              Inspect job (scontrol show job)"),
        Line::from("  u              Follow job output"),
        Line::from("  r              Refresh now"),
        Line::from(""),
        section("Log view"),
        Line::from("  f              Toggle follow"),
        Line::from("  j/k, PgUp/PgDn Scroll"),
        Line::from("  Esc            Close and stop tailing"),
        Line::from(""),
        section("General"),
        Line::from("  ?/F1           Show this help"),
        Line::from("  Esc            Close overlay"),
        Line::from("  q              Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close this help",
            Style::default().fg(theme.muted),
        )),
    ];

    let help_para = Paragraph::new(help_text)
        .block(popup_block(" Help ", theme.border_focused))
        .style(Style::default().fg(theme.fg));

    frame.render_widget(help_para, popup_area);
}

pub fn render_confirm_dialog(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup_area);

    let Some(action) = app.modal.confirm_action() else {
        return;
    };

    let block = popup_block(" Confirm Action ", theme.warning);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(action.description(), Style::default().bold()),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("[y/Enter]", Style::default().fg(theme.warning).bold()),
            Span::raw(" to confirm, "),
            Span::styled("[n/Esc]", Style::default().fg(theme.muted).bold()),
            Span::raw(" to cancel"),
        ]),
    ];

    let para = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg))
        .alignment(Alignment::Left);
    frame.render_widget(para, inner);
}

/// `scontrol show job` fields, one `key: value` per line
pub fn render_inspect_view(view: &InspectView, frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(80, 85, area);
    frame.render_widget(Clear, popup_area);

    let title = match view.details.job_name() {
        Some(name) => format!(" Details for Job {} ({}) ", view.job_id, name),
        None => format!(" Details for Job {} ", view.job_id),
    };
    let block = popup_block(title, theme.border_focused)
    .title_bottom(Line::from(" j/k scroll, Esc close ").right_aligned());

    let lines: Vec<Line> = if view.details.is_empty() {
        vec![Line::from(Span::styled(
            "No details available.",
            Style::default().fg(theme.muted),
        ))]
    } else {
        view.details
            .entries()
            .iter()
            .skip(view.scroll)
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(theme.title).bold()),
                    Span::raw(value.as_str()),
                ])
            })
            .collect()
    };

    let para = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(theme.fg));
    frame.render_widget(para, popup_area);
}

pub fn render_toast(toast: &Toast, frame: &mut Frame, area: Rect, theme: &Theme) {
    // Position toast at bottom-right, above the status bar
    let toast_width = (toast.message.chars().count() + 4).min(50) as u16;
    let toast_area = Rect {
        x: area.width.saturating_sub(toast_width + 2),
        y: area.height.saturating_sub(5),
        width: toast_width.min(area.width),
        height: 3.min(area.height),
    };

    frame.render_widget(Clear, toast_area);

    let border_color = if toast.success {
        theme.running
    } else {
        theme.failed
    };

    let para = Paragraph::new(format!(" {} ", toast.message))
        .block(popup_block("", border_color))
        .style(Style::default().fg(theme.fg))
        .alignment(Alignment::Center);

    frame.render_widget(para, toast_area);
}
