use serde::Serialize;

use crate::stage::{ANALYZING_PERCENT, COMPLETE_PERCENT, Stage, UPLOAD_BAND_END};

/// Generation counter identifying one submission.
///
/// Every new submission takes the next id; callbacks tagged with an older id
/// are stale and must not touch state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Map uploaded bytes into the 0..=30 band, rounding half up.
///
/// Returns `None` when the total is unknown (zero).
pub fn upload_percent(bytes_sent: u64, bytes_total: u64) -> Option<u8> {
    if bytes_total == 0 {
        return None;
    }
    let sent = bytes_sent.min(bytes_total) as u128;
    let total = bytes_total as u128;
    let band = UPLOAD_BAND_END as u128;
    Some(((band * sent * 2 + total) / (total * 2)) as u8)
}

/// Mutable state of a single submission.
///
/// Every transition method returns `true` only when it changed something, so
/// callers publish exactly when there is news. Transitions out of order are
/// refused rather than applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionState {
    id: SubmissionId,
    stage: Stage,
    percent: u8,
    extracted_text: Option<String>,
    analysis: Option<String>,
    error: Option<String>,
}

impl SubmissionState {
    /// State before anything was submitted.
    pub fn idle() -> Self {
        Self {
            id: SubmissionId::default(),
            stage: Stage::Idle,
            percent: 0,
            extracted_text: None,
            analysis: None,
            error: None,
        }
    }

    /// Fresh state for a submission that is about to upload.
    pub fn new(id: SubmissionId) -> Self {
        Self {
            id,
            stage: Stage::Uploading,
            ..Self::idle()
        }
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply a byte-progress report while uploading.
    pub fn record_upload(&mut self, bytes_sent: u64, bytes_total: u64) -> bool {
        if self.stage != Stage::Uploading {
            return false;
        }
        match upload_percent(bytes_sent, bytes_total) {
            Some(percent) if percent > self.percent => {
                self.percent = percent;
                true
            }
            _ => false,
        }
    }

    /// The transport succeeded: the text is known, extraction is "running".
    pub fn begin_extracting(&mut self, text: String) -> bool {
        if self.stage != Stage::Uploading {
            return false;
        }
        self.extracted_text = Some(text);
        self.stage = Stage::Extracting;
        self.percent = self.percent.max(UPLOAD_BAND_END);
        true
    }

    pub fn begin_analyzing(&mut self) -> bool {
        if self.stage != Stage::Extracting {
            return false;
        }
        self.stage = Stage::Analyzing;
        self.percent = self.percent.max(ANALYZING_PERCENT);
        true
    }

    /// Reveal the analysis and finish.
    pub fn complete(&mut self, analysis: String) -> bool {
        if self.stage != Stage::Analyzing {
            return false;
        }
        self.analysis = Some(analysis);
        self.stage = Stage::Complete;
        self.percent = COMPLETE_PERCENT;
        true
    }

    /// Abort from any in-progress stage. Fields already set are kept.
    pub fn fail(&mut self, reason: String) -> bool {
        if !self.stage.is_in_progress() {
            return false;
        }
        self.error = Some(reason);
        self.stage = Stage::Failed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uploading() -> SubmissionState {
        SubmissionState::new(SubmissionId::default().next())
    }

    #[test]
    fn upload_percent_rounds_into_band() {
        assert_eq!(upload_percent(250, 1000), Some(8));
        assert_eq!(upload_percent(500, 1000), Some(15));
        assert_eq!(upload_percent(1000, 1000), Some(30));
        assert_eq!(upload_percent(0, 1000), Some(0));
        assert_eq!(upload_percent(1, 3), Some(10));
    }

    #[test]
    fn upload_percent_clamps_overshoot_and_ignores_unknown_total() {
        assert_eq!(upload_percent(5000, 1000), Some(30));
        assert_eq!(upload_percent(10, 0), None);
        assert_eq!(upload_percent(u64::MAX, u64::MAX), Some(30));
    }

    #[test]
    fn record_upload_is_monotonic() {
        let mut state = uploading();
        let mut last = 0;
        for sent in [0, 100, 90, 400, 400, 399, 1000, 700] {
            state.record_upload(sent, 1000);
            assert!(state.percent() >= last);
            assert!(state.percent() <= UPLOAD_BAND_END);
            last = state.percent();
        }
        assert_eq!(state.percent(), 30);
    }

    proptest! {
        #[test]
        fn upload_progress_never_regresses(
            total in 1u64..=u64::MAX,
            fractions in proptest::collection::vec(0.0f64..=1.25, 1..40),
        ) {
            let mut state = uploading();
            let mut highest = 0u8;
            for fraction in fractions {
                let sent = (total as f64 * fraction) as u64;
                let before = state.percent();
                let changed = state.record_upload(sent, total);
                let expected = upload_percent(sent, total).unwrap_or(0);
                highest = highest.max(expected);

                prop_assert!(state.percent() >= before);
                prop_assert!(state.percent() <= UPLOAD_BAND_END);
                prop_assert_eq!(state.percent(), highest);
                prop_assert_eq!(changed, state.percent() > before);
                prop_assert_eq!(state.stage(), Stage::Uploading);
            }
        }
    }

    #[test]
    fn record_upload_reports_change_only() {
        let mut state = uploading();
        assert!(!state.record_upload(0, 1000));
        assert!(state.record_upload(250, 1000));
        assert!(!state.record_upload(250, 1000));
        assert!(!state.record_upload(100, 1000));
    }

    #[test]
    fn success_path_order_is_enforced() {
        let mut state = uploading();
        assert!(!state.begin_analyzing());
        assert!(!state.complete("A".into()));

        assert!(state.begin_extracting("T".into()));
        assert_eq!((state.stage(), state.percent()), (Stage::Extracting, 30));
        assert!(!state.record_upload(1000, 1000));
        assert!(!state.begin_extracting("again".into()));

        assert!(state.begin_analyzing());
        assert_eq!((state.stage(), state.percent()), (Stage::Analyzing, 60));
        assert!(state.analysis().is_none());

        assert!(state.complete("A".into()));
        assert_eq!(state.stage(), Stage::Complete);
        assert_eq!(state.percent(), 100);
        assert_eq!(state.extracted_text(), Some("T"));
        assert_eq!(state.analysis(), Some("A"));
    }

    #[test]
    fn failure_freezes_state() {
        let mut state = uploading();
        state.record_upload(500, 1000);
        state.begin_extracting("T".into());

        assert!(state.fail("decode error".into()));
        let frozen = state.clone();

        assert!(!state.begin_analyzing());
        assert!(!state.complete("A".into()));
        assert!(!state.fail("second".into()));
        assert!(!state.record_upload(1000, 1000));
        assert_eq!(state, frozen);
        assert_eq!(state.extracted_text(), Some("T"));
        assert_eq!(state.percent(), 30);
        assert_eq!(state.error(), Some("decode error"));
    }

    #[test]
    fn complete_is_terminal() {
        let mut state = uploading();
        state.begin_extracting("T".into());
        state.begin_analyzing();
        state.complete("A".into());
        assert!(!state.fail("late".into()));
        assert_eq!(state.stage(), Stage::Complete);
        assert!(state.error().is_none());
    }

    #[test]
    fn idle_state_cannot_fail() {
        let mut state = SubmissionState::idle();
        assert!(!state.fail("nothing running".into()));
        assert_eq!(state.stage(), Stage::Idle);
    }
}
