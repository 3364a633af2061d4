use ratatui::layout::{Constraint, Flex, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Cell, Clear, Row, Table};
use ratatui::Frame;

use crate::theme::Theme;

/// Key bindings shown in the overlay, in display order.
const BINDINGS: &[(&str, &str)] = &[
    ("Enter", "Analyze selected report"),
    ("r", "Restart with selected report"),
    ("j / k", "Select next / previous report"),
    ("g / G", "First / last report"),
    ("PgDn / PgUp", "Scroll results"),
    ("Esc", "Back to top of results"),
    ("?", "Close this help"),
    ("q / Ctrl+c", "Quit"),
];

/// Render the key bindings as a popup in the middle of the screen.
pub fn render(f: &mut Frame, theme: &Theme) {
    let height = BINDINGS.len() as u16 + 2;
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(f.area());
    let [popup] = Layout::horizontal([Constraint::Length(48)])
        .flex(Flex::Center)
        .areas(row);

    let rows = BINDINGS.iter().map(|(key, action)| {
        Row::new([
            Cell::from(*key).style(theme.heading_style()),
            Cell::from(*action).style(Style::default().fg(theme.text)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.active))
            .title(" Keys "),
    );

    f.render_widget(Clear, popup);
    f.render_widget(table, popup);
}
