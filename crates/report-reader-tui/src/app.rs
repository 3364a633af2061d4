use std::path::PathBuf;

use report_reader_core::{ResultViewModel, Stage, SubmissionId};

use crate::action::Action;
use crate::model::report::ReportEntry;
use crate::theme::Theme;
use crate::tui_event::BackendEvent;

/// Main application state.
pub struct App {
    pub reports: Vec<ReportEntry>,
    pub cursor: usize,
    /// Latest snapshot of the live (or most recent) submission.
    pub view: ResultViewModel,
    /// Which report the current view belongs to.
    pub active_report: Option<usize>,
    pub current_submission: Option<SubmissionId>,
    pub endpoint: String,
    pub tick: usize,
    pub theme: Theme,
    pub should_quit: bool,
    pub show_help: bool,
    pub result_scroll: u16,
    /// Height of the results pane (set on resize, used for page up/down).
    pub visible_rows: usize,
    submit_request: Option<usize>,
}

impl App {
    pub fn new(paths: Vec<PathBuf>, endpoint: String) -> Self {
        Self {
            reports: paths.into_iter().map(ReportEntry::new).collect(),
            cursor: 0,
            view: ResultViewModel::default(),
            active_report: None,
            current_submission: None,
            endpoint,
            tick: 0,
            theme: Theme::clinic(),
            should_quit: false,
            show_help: false,
            result_scroll: 0,
            visible_rows: 10,
            submit_request: None,
        }
    }

    /// Process an action and return whether the app should quit.
    pub fn update(&mut self, action: Action) -> bool {
        if self.show_help {
            match action {
                Action::Quit => {
                    self.should_quit = true;
                    return true;
                }
                Action::ToggleHelp | Action::NavigateBack => {
                    self.show_help = false;
                }
                Action::Tick => {
                    self.tick = self.tick.wrapping_add(1);
                }
                Action::Resize(_w, h) => self.resize(h),
                _ => {}
            }
            return false;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
                return true;
            }
            Action::ToggleHelp => {
                self.show_help = true;
            }
            Action::NavigateBack => {
                self.result_scroll = 0;
            }
            Action::MoveDown => {
                if self.cursor + 1 < self.reports.len() {
                    self.cursor += 1;
                }
            }
            Action::MoveUp => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            Action::GoTop => self.cursor = 0,
            Action::GoBottom => {
                self.cursor = self.reports.len().saturating_sub(1);
            }
            Action::Submit => {
                // The submit control is disabled while a submission is running.
                if !self.view.is_in_progress() {
                    self.request_submit();
                }
            }
            Action::Resubmit => self.request_submit(),
            Action::ScrollDown => {
                let page = self.visible_rows.max(1) as u16;
                self.result_scroll = self.result_scroll.saturating_add(page);
            }
            Action::ScrollUp => {
                let page = self.visible_rows.max(1) as u16;
                self.result_scroll = self.result_scroll.saturating_sub(page);
            }
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            Action::Resize(_w, h) => self.resize(h),
            Action::None => {}
        }
        false
    }

    fn resize(&mut self, height: u16) {
        // header, subtitle, list, gauge, footer
        self.visible_rows = (height as usize).saturating_sub(18).max(1);
    }

    fn request_submit(&mut self) {
        if self.cursor < self.reports.len() {
            self.submit_request = Some(self.cursor);
        }
    }

    /// Take the report index the user asked to submit, if any.
    pub fn take_submit_request(&mut self) -> Option<usize> {
        self.submit_request.take()
    }

    /// Record that `report_index` is now being processed as submission `id`.
    pub fn begin_submission(&mut self, report_index: usize, id: SubmissionId) {
        if let Some(previous) = self.active_report {
            if let Some(entry) = self.reports.get_mut(previous) {
                entry.mark_abandoned();
            }
        }
        self.active_report = Some(report_index);
        self.current_submission = Some(id);
        // Matches the controller's first snapshot, so Submit stays disabled
        // before the forwarder delivers it.
        self.view = ResultViewModel {
            submission_id: id,
            stage: Stage::Uploading,
            ..ResultViewModel::default()
        };
        self.result_scroll = 0;
    }

    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Update { report_index, view } => {
                // Forwarders of superseded submissions may still be draining.
                if self.current_submission != Some(view.submission_id) {
                    return;
                }
                if let Some(entry) = self.reports.get_mut(report_index) {
                    entry.record_stage(view.stage);
                }
                self.view = view;
            }
        }
    }

    /// Filename of the report the current view belongs to.
    pub fn active_filename(&self) -> Option<&str> {
        self.active_report
            .and_then(|i| self.reports.get(i))
            .map(|r| r.filename.as_str())
    }

    /// Render the current state.
    pub fn view(&self, f: &mut ratatui::Frame) {
        crate::view::render(f, self);

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }
}
