use tokio::sync::mpsc;

use report_reader_core::{
    Config, ProgressStageController, StageDelays, SubmissionId, UploadTransport,
};
use report_reader_http::HttpTransport;

use crate::tui_event::BackendEvent;

/// Owns the stage controller and forwards each submission's snapshots to the
/// TUI event channel, tagged with the report they belong to.
pub struct Backend<T: UploadTransport> {
    controller: ProgressStageController<T>,
    tx: mpsc::UnboundedSender<BackendEvent>,
}

impl<T: UploadTransport> Backend<T> {
    pub fn new(transport: T, delays: StageDelays, tx: mpsc::UnboundedSender<BackendEvent>) -> Self {
        Self {
            controller: ProgressStageController::new(transport, delays),
            tx,
        }
    }

    /// Submit a report, superseding whatever was running.
    pub fn submit(&self, report_index: usize, payload: T::Payload) -> SubmissionId {
        let mut sub = self.controller.start_submission(payload);
        let id = sub.id();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            while let Some(view) = sub.next().await {
                if tx.send(BackendEvent::Update { report_index, view }).is_err() {
                    break;
                }
            }
        });
        id
    }

    /// Invalidate the live submission before exiting.
    pub fn shutdown(&self) {
        self.controller.teardown();
    }
}

/// Build the HTTP-backed backend from resolved configuration.
pub fn http_backend(
    config: &Config,
    tx: mpsc::UnboundedSender<BackendEvent>,
) -> anyhow::Result<Backend<HttpTransport>> {
    let transport = HttpTransport::new(config)?;
    Ok(Backend::new(transport, config.delays, tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    use report_reader_core::{ProcessedReport, ProgressCallback, Stage, TransportFailure};

    /// Answers instantly with the payload echoed back.
    struct EchoTransport;

    impl UploadTransport for EchoTransport {
        type Payload = String;

        fn upload(
            &self,
            payload: String,
            progress: ProgressCallback,
        ) -> impl Future<Output = Result<ProcessedReport, TransportFailure>> + Send {
            async move {
                progress(10, 10);
                Ok(ProcessedReport {
                    text: payload,
                    analysis: "ok".into(),
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_snapshots_tagged_with_report() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Backend::new(
            EchoTransport,
            StageDelays {
                extracting: Duration::from_millis(100),
                analyzing: Duration::from_millis(100),
            },
            tx,
        );
        let id = backend.submit(3, "scan.png".into());

        let mut stages = Vec::new();
        while let Some(BackendEvent::Update { report_index, view }) = rx.recv().await {
            assert_eq!(report_index, 3);
            assert_eq!(view.submission_id, id);
            stages.push(view.stage);
            if view.is_terminal() {
                assert_eq!(view.extracted_text.as_deref(), Some("scan.png"));
                break;
            }
        }
        assert_eq!(
            stages,
            vec![
                Stage::Uploading,
                Stage::Uploading,
                Stage::Extracting,
                Stage::Analyzing,
                Stage::Complete
            ]
        );
    }
}
