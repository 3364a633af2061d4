use serde::Serialize;

/// Upper bound of the percent band driven by real upload bytes.
pub const UPLOAD_BAND_END: u8 = 30;

/// Percent published when the analysis stage begins.
pub const ANALYZING_PERCENT: u8 = 60;

/// Percent published on completion.
pub const COMPLETE_PERCENT: u8 = 100;

/// Lifecycle phase of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Uploading,
    Extracting,
    Analyzing,
    Complete,
    Failed,
}

impl Stage {
    /// User-facing label. Failed has no label; its error is shown on its own.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Uploading => "Uploading Report",
            Self::Extracting => "Extracting Text",
            Self::Analyzing => "Analyzing with AI",
            Self::Complete => "Processing Complete!",
            Self::Failed => "",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Uploading | Self::Extracting | Self::Analyzing)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
