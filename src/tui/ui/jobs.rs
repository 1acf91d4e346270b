//! Job table rendering

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::formatting::truncate_string;
use crate::tui::app::{App, JobRow};
use crate::tui::theme::Theme;

use super::widgets::{calculate_scroll_offset, create_table_header};

const COLUMNS: [&str; 6] = ["JOBID", "PARTITION", "NAME", "STATE", "TIME", "NODELIST(REASON)"];

pub fn render_jobs_view(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = if app.selection.is_empty() {
        " Jobs ".to_string()
    } else {
        format!(" Jobs ({} selected) ", app.selection.len())
    };

    let border = if app.modal.is_active() {
        theme.border
    } else {
        theme.border_focused
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.table.is_empty() {
        let msg = if app.timing.last_refresh.is_none() && !app.reconciler.is_idle() {
            "Loading jobs..."
        } else {
            "No jobs found"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(theme.muted))
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    }

    let header = create_table_header(&COLUMNS, theme);

    let available_height = inner.height.saturating_sub(1) as usize; // -1 for header
    let selected = app.table.list_state.selected;
    let scroll_offset = calculate_scroll_offset(selected, available_height, app.table.len());
    let name_max = app.config.display.name_max_length;

    let rows: Vec<Row> = app
        .table
        .rows()
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(available_height)
        .map(|(idx, row)| job_to_row(row, idx == selected, name_max, theme))
        .collect();

    let widths = [
        Constraint::Length(14), // JOBID (room for the mark and array ids)
        Constraint::Length(10), // PARTITION
        Constraint::Min(12),    // NAME
        Constraint::Length(11), // STATE
        Constraint::Length(12), // TIME
        Constraint::Min(16),    // NODELIST(REASON)
    ];

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

fn job_to_row<'a>(row: &'a JobRow, is_cursor: bool, name_max: usize, theme: &Theme) -> Row<'a> {
    let job = &row.job;

    let id_cell = if row.selected {
        Cell::from(format!("* {}", job.id)).style(Style::default().fg(theme.marked).bold())
    } else {
        Cell::from(format!("  {}", job.id))
    };

    let state_cell = Cell::from(job.state.as_str())
        .style(Style::default().fg(theme.job_state_color(job.state)));

    let style = if is_cursor {
        Style::default().bg(theme.cursor_bg).fg(theme.cursor_fg)
    } else {
        Style::default().fg(theme.fg)
    };

    Row::new(vec![
        id_cell,
        Cell::from(job.partition.as_str()),
        Cell::from(truncate_string(&job.name, name_max)),
        state_cell,
        Cell::from(row.time_used.as_str()),
        Cell::from(row.placement.as_str()),
    ])
    .style(style)
}
