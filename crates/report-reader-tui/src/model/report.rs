use std::path::PathBuf;

use chrono::{DateTime, Local};
use report_reader_core::Stage;

/// A report file listed in the TUI and its most recent outcome.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub filename: String,
    /// Stage of the latest submission of this file; `None` = never submitted.
    pub last_stage: Option<Stage>,
    pub finished_at: Option<DateTime<Local>>,
}

impl ReportEntry {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            filename,
            last_stage: None,
            finished_at: None,
        }
    }

    /// Record the stage of a new snapshot for this file.
    pub fn record_stage(&mut self, stage: Stage) {
        self.last_stage = Some(stage);
        self.finished_at = if stage.is_terminal() {
            Some(Local::now())
        } else {
            None
        };
    }

    /// The file's submission was superseded before reaching a terminal stage.
    pub fn mark_abandoned(&mut self) {
        if self.last_stage.is_some_and(|s| s.is_in_progress()) {
            self.last_stage = None;
            self.finished_at = None;
        }
    }

    pub fn status_label(&self) -> String {
        let at = self
            .finished_at
            .map(|t| t.format(" %H:%M:%S").to_string())
            .unwrap_or_default();
        match self.last_stage {
            None => "Ready".to_string(),
            Some(Stage::Complete) => format!("Done{at}"),
            Some(Stage::Failed) => format!("Failed{at}"),
            Some(stage) => stage.label().to_string(),
        }
    }
}
