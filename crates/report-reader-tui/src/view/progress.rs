use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::Frame;

use crate::app::App;
use crate::view::spinner_char;

/// Ticks per ellipsis frame, so the dots advance slower than the spinner.
const TICKS_PER_DOT: usize = 4;

/// Render the progress gauge. Hidden once a submission fails or before one starts.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let vm = &app.view;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Progress ");

    if !vm.shows_progress() {
        f.render_widget(block, area);
        return;
    }

    let label = if vm.is_in_progress() {
        format!(
            "{} {} {}%",
            spinner_char(app.tick),
            vm.animated_label(app.tick / TICKS_PER_DOT),
            vm.percent
        )
    } else {
        format!("{} {}%", vm.label(), vm.percent)
    };
    let color = theme.stage_color(Some(vm.stage));

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color).bg(theme.highlight_bg))
        .percent(u16::from(vm.percent.min(100)))
        .label(label);

    f.render_widget(gauge, area);
}
