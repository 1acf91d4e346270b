//! Log view rendering

use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::tui::log_tail::{LogPathSource, LogStatus, LogView};
use crate::tui::theme::Theme;

use super::widgets::popup_block;

pub fn render_log_view(view: &LogView, frame: &mut Frame, area: Rect, theme: &Theme) {
    // Nearly full screen; only the header and status bar stay visible
    let popup_area = area.inner(Margin::new(1, 1));
    frame.render_widget(Clear, popup_area);

    let status_color = match view.status {
        LogStatus::Streaming => theme.running,
        LogStatus::Spawning => theme.muted,
        LogStatus::NotFound | LogStatus::Exited => theme.warning,
        LogStatus::Failed => theme.failed,
    };

    let mut footer = vec![
        Span::raw(" "),
        Span::styled(view.status.label(), Style::default().fg(status_color)),
    ];
    if view.session.log_path().source == LogPathSource::Guessed {
        footer.push(Span::styled(
            " (guessed path)",
            Style::default().fg(theme.warning),
        ));
    }
    footer.push(Span::styled(
        if view.follow { " | following " } else { " | paused " },
        Style::default().fg(theme.muted),
    ));

    let block = popup_block(format!(" {} ", view.title()), theme.border_focused)
        .title_bottom(Line::from(footer));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let height = inner.height as usize;
    let start = view.first_visible(height);
    let lines: Vec<Line> = view
        .lines
        .iter()
        .skip(start)
        .take(height)
        .map(|line| Line::raw(line.as_str()))
        .collect();

    let para = Paragraph::new(lines).style(Style::default().fg(theme.fg));
    frame.render_widget(para, inner);
}
