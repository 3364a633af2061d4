use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

use crate::app::App;
use crate::view::{spinner_char, truncate};

/// Render the list of report files given on the command line.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let name_width = (area.width as usize).saturating_sub(30);

    let header = Row::new(
        ["#", "Report", "Status"]
            .into_iter()
            .map(|h| Cell::from(h).style(theme.heading_style())),
    );

    let rows: Vec<Row> = app
        .reports
        .iter()
        .enumerate()
        .map(|(i, report)| {
            let color = theme.stage_color(report.last_stage);
            let mut status = report.status_label();
            if report.last_stage.is_some_and(|s| s.is_in_progress()) {
                status = format!("{} {status}", spinner_char(app.tick));
            }
            let marker = if app.active_report == Some(i) { "▸" } else { " " };
            Row::new(vec![
                Cell::from(format!("{marker}{}", i + 1)),
                Cell::from(truncate(&report.filename, name_width))
                    .style(Style::default().fg(theme.text)),
                Cell::from(status).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(22),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" Reports ({}) ", app.reports.len())),
        )
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(table, area, &mut state);
}
