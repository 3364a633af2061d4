//! Read-only snapshot handed to the presentation layer.
//!
//! A [`ResultViewModel`] is taken from the controller's state at each publish
//! point. Everything a front end needs to decide what to draw is derived here,
//! so renderers stay free of stage logic.

use serde::Serialize;

use crate::stage::Stage;
use crate::state::{SubmissionId, SubmissionState};

/// Number of ellipsis frames cycled by [`ResultViewModel::animated_label`].
const ELLIPSIS_FRAMES: usize = 4;

/// Immutable snapshot of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultViewModel {
    pub submission_id: SubmissionId,
    pub stage: Stage,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SubmissionState> for ResultViewModel {
    fn from(state: &SubmissionState) -> Self {
        Self {
            submission_id: state.id(),
            stage: state.stage(),
            percent: state.percent(),
            extracted_text: state.extracted_text().map(str::to_owned),
            analysis: state.analysis().map(str::to_owned),
            error: state.error().map(str::to_owned),
        }
    }
}

impl Default for ResultViewModel {
    fn default() -> Self {
        Self::from(&SubmissionState::idle())
    }
}

impl ResultViewModel {
    pub fn label(&self) -> &'static str {
        self.stage.label()
    }

    /// Stage label with a trailing ellipsis that grows with `tick` while the
    /// submission is in progress. Terminal labels are returned unchanged.
    pub fn animated_label(&self, tick: usize) -> String {
        let label = self.label();
        if !self.stage.is_in_progress() {
            return label.to_string();
        }
        format!("{label}{}", ".".repeat(tick % ELLIPSIS_FRAMES))
    }

    pub fn is_in_progress(&self) -> bool {
        self.stage.is_in_progress()
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Whether a progress bar should be drawn. Hidden once failed so stale
    /// progress never sits next to an error.
    pub fn shows_progress(&self) -> bool {
        self.stage.is_in_progress() || self.stage == Stage::Complete
    }

    /// Extracted text, unless the submission failed.
    pub fn visible_text(&self) -> Option<&str> {
        match self.stage {
            Stage::Failed => None,
            _ => self.extracted_text.as_deref(),
        }
    }

    /// Analysis, unless the submission failed.
    pub fn visible_analysis(&self) -> Option<&str> {
        match self.stage {
            Stage::Failed => None,
            _ => self.analysis.as_deref(),
        }
    }

    /// Error line as the front ends print it.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| format!("Error: {e}"))
    }
}
