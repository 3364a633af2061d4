use thiserror::Error;

pub mod config;
pub mod controller;
pub mod stage;
pub mod state;
pub mod timer;
pub mod transport;
pub mod view_model;

// Re-export for convenience
pub use config::{Config, ConfigError, ConfigFile, StageDelays};
pub use controller::{ProgressStageController, Subscription};
pub use stage::Stage;
pub use state::{SubmissionId, SubmissionState};
pub use timer::StageTimer;
pub use transport::{ProcessedReport, ProgressCallback, UploadTransport};
pub use view_model::ResultViewModel;

/// The single failure kind reported by an upload transport.
///
/// Network errors, non-2xx responses and undecodable bodies all collapse into
/// this one value; the controller never distinguishes between them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransportFailure {
    pub reason: String,
}

impl TransportFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<String> for TransportFailure {
    fn from(reason: String) -> Self {
        Self { reason }
    }
}

impl From<&str> for TransportFailure {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}
