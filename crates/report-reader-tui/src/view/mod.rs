pub mod help;
pub mod progress;
pub mod reports;
pub mod results;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::theme::Theme;

/// Spinner frames for animated progress indication.
const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Get the current spinner character based on a tick counter.
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Truncate a string to fit in `max_width` columns, appending "…" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Render the whole screen: header, report list, progress, results, footer.
pub fn render(f: &mut Frame, app: &App) {
    let list_height = (app.reports.len() as u16).saturating_add(3).clamp(4, 10);
    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Length(1), // subtitle
        Constraint::Length(list_height),
        Constraint::Length(3), // progress
        Constraint::Min(5),    // results
        Constraint::Length(1), // footer
    ])
    .split(f.area());

    render_header(f, chunks[0], &app.theme);
    render_subtitle(f, chunks[1], &app.theme);
    reports::render(f, chunks[2], app);
    progress::render(f, chunks[3], app);
    results::render(f, chunks[4], app);
    render_footer(f, chunks[5], app);
}

fn render_header(f: &mut Frame, area: Rect, theme: &Theme) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" REPORT READER ", theme.header_style()),
        Span::styled(
            " Medical Report Reader",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]));
    f.render_widget(header, area);
}

fn render_subtitle(f: &mut Frame, area: Rect, theme: &Theme) {
    let subtitle = Paragraph::new(Span::styled(
        " Upload a medical report image to analyze its contents",
        Style::default().fg(theme.dim),
    ));
    f.render_widget(subtitle, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let submit_hint = if app.view.is_in_progress() {
        " | Processing...  r:restart  ?:help  q:quit"
    } else {
        " | j/k:nav  Enter:analyze  r:restart  ?:help  q:quit"
    };
    let endpoint_width = (area.width as usize).saturating_sub(submit_hint.len() + 2);

    let footer = Line::from(vec![
        Span::styled(
            format!(" {}", truncate(&app.endpoint, endpoint_width)),
            Style::default().fg(theme.dim),
        ),
        Span::styled(submit_hint, theme.footer_style()),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}
