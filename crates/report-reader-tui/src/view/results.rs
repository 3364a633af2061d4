use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::theme::Theme;

/// Render extracted text and analysis, or the error of a failed submission.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let vm = &app.view;
    let mut lines: Vec<Line> = Vec::new();

    if let Some(message) = vm.error_message() {
        lines.push(Line::from(Span::styled(message, theme.error_style())));
    } else {
        if let Some(text) = vm.visible_text() {
            section(&mut lines, "Extracted Text:", text, theme);
        }
        if let Some(analysis) = vm.visible_analysis() {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            section(&mut lines, "AI Analysis:", analysis, theme);
        }
        if lines.is_empty() && !vm.is_in_progress() {
            lines.push(Line::from(Span::styled(
                "Select a report and press Enter to analyze it.",
                Style::default().fg(theme.dim),
            )));
        }
    }

    let title = match app.active_filename() {
        Some(name) => format!(" Results: {name} "),
        None => " Results ".to_string(),
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));

    f.render_widget(paragraph, area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, heading: &'a str, body: &'a str, theme: &Theme) {
    lines.push(Line::from(Span::styled(heading, theme.heading_style())));
    for line in body.lines() {
        lines.push(Line::from(Span::styled(line, Style::default().fg(theme.text))));
    }
}
