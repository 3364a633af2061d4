//! Progress stage controller.
//!
//! Owns the single live [`SubmissionState`] and moves it through
//! Uploading → Extracting → Analyzing → Complete (or Failed) in response to
//! three asynchronous sources: transport byte progress, the transport's
//! terminal outcome, and [`StageTimer`] firings. Each source is tagged with
//! the submission id it belongs to and is ignored once that id is no longer
//! live, which is what lets a new submission simply replace an old one.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::TransportFailure;
use crate::config::StageDelays;
use crate::state::{SubmissionId, SubmissionState};
use crate::timer::StageTimer;
use crate::transport::{ProcessedReport, ProgressCallback, UploadTransport};
use crate::view_model::ResultViewModel;

/// Ordered stream of snapshots for one submission.
///
/// The stream ends after the terminal snapshot, or early when the submission
/// is superseded or the controller is torn down.
#[derive(Debug)]
pub struct Subscription {
    id: SubmissionId,
    rx: mpsc::UnboundedReceiver<ResultViewModel>,
}

impl Subscription {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Wait for the next snapshot. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<ResultViewModel> {
        self.rx.recv().await
    }

    /// Take an already published snapshot without waiting.
    pub fn try_next(&mut self) -> Option<ResultViewModel> {
        self.rx.try_recv().ok()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<ResultViewModel> {
        UnboundedReceiverStream::new(self.rx)
    }
}

/// Drives one submission at a time through its stages.
///
/// All methods must be called from within a Tokio runtime.
pub struct ProgressStageController<T: UploadTransport> {
    transport: Arc<T>,
    shared: Arc<Shared>,
}

struct Shared {
    live: Mutex<Live>,
    timer: StageTimer,
    delays: StageDelays,
}

struct Live {
    state: SubmissionState,
    /// Id accepting callbacks; `None` after a terminal stage or teardown.
    active: Option<SubmissionId>,
    publisher: Option<mpsc::UnboundedSender<ResultViewModel>>,
    cancel: CancellationToken,
}

impl Live {
    fn accepts(&self, id: SubmissionId) -> bool {
        self.active == Some(id)
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop accepting callbacks for the live id and close its stream.
    fn retire(&self, live: &mut Live) {
        if let Some(id) = live.active.take() {
            log::debug!("submission {id} retired at {}", live.state.stage());
        }
        self.timer.cancel_all(live.state.id());
        live.cancel.cancel();
        live.publisher = None;
    }

    fn publish(&self, live: &mut Live) {
        let snapshot = ResultViewModel::from(&live.state);
        if let Some(tx) = &live.publisher {
            let _ = tx.send(snapshot);
        }
        if live.state.stage().is_terminal() {
            self.retire(live);
        }
    }

    fn on_progress(&self, id: SubmissionId, bytes_sent: u64, bytes_total: u64) {
        let mut live = self.lock();
        if live.accepts(id) && live.state.record_upload(bytes_sent, bytes_total) {
            log::trace!(
                "submission {id}: {bytes_sent}/{bytes_total} bytes, {}%",
                live.state.percent()
            );
            self.publish(&mut live);
        }
    }

    fn on_outcome(self: &Arc<Self>, id: SubmissionId, outcome: Result<ProcessedReport, TransportFailure>) {
        match outcome {
            Ok(report) => self.begin_extracting(id, report),
            Err(failure) => self.fail(id, failure),
        }
    }

    fn begin_extracting(self: &Arc<Self>, id: SubmissionId, report: ProcessedReport) {
        let ProcessedReport { text, analysis } = report;
        let mut live = self.lock();
        if !live.accepts(id) || !live.state.begin_extracting(text) {
            return;
        }
        log::debug!("submission {id}: results received, extracting");
        self.publish(&mut live);

        let shared = Arc::clone(self);
        self.timer.schedule(self.delays.extracting, id, move || {
            shared.begin_analyzing(id, analysis)
        });
    }

    fn begin_analyzing(self: &Arc<Self>, id: SubmissionId, analysis: String) {
        let mut live = self.lock();
        if !live.accepts(id) || !live.state.begin_analyzing() {
            return;
        }
        log::debug!("submission {id}: analyzing");
        self.publish(&mut live);

        let shared = Arc::clone(self);
        self.timer.schedule(self.delays.analyzing, id, move || {
            shared.complete(id, analysis)
        });
    }

    fn complete(&self, id: SubmissionId, analysis: String) {
        let mut live = self.lock();
        if !live.accepts(id) || !live.state.complete(analysis) {
            return;
        }
        log::info!("submission {id} complete");
        self.publish(&mut live);
    }

    fn fail(&self, id: SubmissionId, failure: TransportFailure) {
        let mut live = self.lock();
        if !live.accepts(id) || !live.state.fail(failure.reason) {
            return;
        }
        log::warn!(
            "submission {id} failed during upload or processing: {}",
            live.state.error().unwrap_or_default()
        );
        self.publish(&mut live);
    }
}

impl<T: UploadTransport> ProgressStageController<T> {
    pub fn new(transport: T, delays: StageDelays) -> Self {
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared {
                live: Mutex::new(Live {
                    state: SubmissionState::idle(),
                    active: None,
                    publisher: None,
                    cancel: CancellationToken::new(),
                }),
                timer: StageTimer::new(),
                delays,
            }),
        }
    }

    /// Start a new submission, superseding any live one.
    ///
    /// The returned subscription has already received the initial
    /// `(Uploading, 0)` snapshot.
    pub fn start_submission(&self, payload: T::Payload) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let id = {
            let mut live = self.shared.lock();
            self.shared.retire(&mut live);
            let id = live.state.id().next();
            live.state = SubmissionState::new(id);
            live.active = Some(id);
            live.publisher = Some(tx);
            live.cancel = cancel.clone();
            self.shared.publish(&mut live);
            id
        };
        log::info!("submission {id} started");

        let progress: ProgressCallback = {
            let shared = Arc::clone(&self.shared);
            Arc::new(move |bytes_sent, bytes_total| {
                shared.on_progress(id, bytes_sent, bytes_total)
            })
        };
        let transport = Arc::clone(&self.transport);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("submission {id}: transport call abandoned");
                    return;
                }
                outcome = transport.upload(payload, progress) => outcome,
            };
            shared.on_outcome(id, outcome);
        });

        Subscription { id, rx }
    }

    /// Snapshot of the most recent submission (idle before the first one).
    pub fn snapshot(&self) -> ResultViewModel {
        ResultViewModel::from(&self.shared.lock().state)
    }

    /// Id of the submission still accepting updates, if any.
    pub fn live_submission(&self) -> Option<SubmissionId> {
        self.shared.lock().active
    }

    pub fn delays(&self) -> StageDelays {
        self.shared.delays
    }

    /// Invalidate the live submission: pending timers and transport callbacks
    /// become no-ops and its subscription ends. The last snapshot is kept.
    pub fn teardown(&self) {
        let mut live = self.shared.lock();
        self.shared.retire(&mut live);
    }
}

impl<T: UploadTransport> Drop for ProgressStageController<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
