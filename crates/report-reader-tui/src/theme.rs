use ratatui::style::{Color, Modifier, Style};

use report_reader_core::Stage;

/// Color theme for the TUI.
pub struct Theme {
    pub complete: Color,
    pub failed: Color,
    pub active: Color,
    pub ready: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub text: Color,
    pub dim: Color,
    pub highlight_bg: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    /// Clinical blue-on-dark terminal theme.
    pub fn clinic() -> Self {
        Self {
            complete: Color::Green,
            failed: Color::Red,
            active: Color::Cyan,
            ready: Color::DarkGray,

            header_fg: Color::White,
            header_bg: Color::Blue,
            border: Color::DarkGray,
            text: Color::White,
            dim: Color::DarkGray,
            highlight_bg: Color::Rgb(25, 35, 60),
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    /// Color for a report's last known stage (`None` = never submitted).
    pub fn stage_color(&self, stage: Option<Stage>) -> Color {
        match stage {
            None | Some(Stage::Idle) => self.ready,
            Some(Stage::Uploading | Stage::Extracting | Stage::Analyzing) => self.active,
            Some(Stage::Complete) => self.complete,
            Some(Stage::Failed) => self.failed,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default().fg(self.header_fg).bg(self.header_bg).add_modifier(Modifier::BOLD)
    }

    pub fn heading_style(&self) -> Style {
        Style::default().fg(self.active).add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.failed).add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default().bg(self.highlight_bg).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}
