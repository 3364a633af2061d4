use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TransportFailure;

/// Byte-progress callback handed to a transport: `(bytes_sent, bytes_total)`.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Both derived results, delivered together by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedReport {
    pub text: String,
    pub analysis: String,
}

/// Performs the actual submission of a report.
///
/// Implementations call `progress` zero or more times while sending, then
/// resolve exactly once. Dropping the returned future abandons the call.
pub trait UploadTransport: Send + Sync + 'static {
    /// What gets sent. Opaque to the controller.
    type Payload: Send + 'static;

    fn upload(
        &self,
        payload: Self::Payload,
        progress: ProgressCallback,
    ) -> impl Future<Output = Result<ProcessedReport, TransportFailure>> + Send;
}
