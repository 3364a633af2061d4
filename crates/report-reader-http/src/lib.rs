//! HTTP transport for report submissions.
//!
//! Posts the report as `multipart/form-data` to the processing backend and
//! reports upload progress as the body is streamed. The backend answers with
//! one JSON object carrying both the extracted text and the analysis.

use std::future::Future;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, Stream, StreamExt};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use report_reader_core::{
    Config, ProcessedReport, ProgressCallback, TransportFailure, UploadTransport,
};

/// Size of each body chunk handed to the HTTP stack.
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Request failed with status code {0}")]
    Status(u16),
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<HttpError> for TransportFailure {
    fn from(err: HttpError) -> Self {
        TransportFailure::new(err.to_string())
    }
}

/// A report file to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUpload {
    pub path: PathBuf,
}

impl ReportUpload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name sent in the multipart part.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "report".to_string())
    }
}

/// MIME type derived from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Split `bytes` into body chunks, reporting cumulative progress as each
/// chunk is taken by the consumer.
pub fn progress_stream(
    bytes: Vec<u8>,
    progress: ProgressCallback,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
    let total = bytes.len() as u64;
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(sent, total);
        Ok(chunk)
    })
}

/// Uploads reports with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    field_name: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        upload: ReportUpload,
        progress: ProgressCallback,
    ) -> Result<ProcessedReport, HttpError> {
        let bytes = tokio::fs::read(&upload.path)
            .await
            .map_err(|source| HttpError::Read {
                path: upload.path.clone(),
                source,
            })?;
        let total = bytes.len() as u64;
        let file_name = upload.file_name();
        log::info!("uploading {file_name} ({total} bytes) to {}", self.endpoint);

        progress(0, total);
        let body = Body::wrap_stream(progress_stream(bytes, progress));
        let part = Part::stream_with_length(body, total)
            .file_name(file_name)
            .mime_str(mime_for(&upload.path))?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }
        log::debug!("backend answered {status}");
        response
            .json::<ProcessedReport>()
            .await
            .map_err(HttpError::Decode)
    }
}

impl UploadTransport for HttpTransport {
    type Payload = ReportUpload;

    fn upload(
        &self,
        payload: ReportUpload,
        progress: ProgressCallback,
    ) -> impl Future<Output = Result<ProcessedReport, TransportFailure>> + Send {
        async move {
            self.send(payload, progress).await.map_err(|err| {
                log::warn!("upload to {} failed: {err}", self.endpoint);
                TransportFailure::from(err)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<(u64, u64)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        });
        (callback, seen)
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("scan.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("lab/result.pdf")), "application/pdf");
        assert_eq!(mime_for(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn file_name_from_path() {
        assert_eq!(ReportUpload::new("/tmp/xray.png").file_name(), "xray.png");
        assert_eq!(ReportUpload::new("/").file_name(), "report");
    }

    #[tokio::test]
    async fn stream_reports_cumulative_progress() {
        let (callback, seen) = recorder();
        let bytes = vec![7u8; CHUNK_SIZE * 2 + 10];
        let chunks: Vec<_> = progress_stream(bytes, callback).collect().await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].as_ref().unwrap().len(), 10);
        let total = (CHUNK_SIZE * 2 + 10) as u64;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (CHUNK_SIZE as u64, total),
                (CHUNK_SIZE as u64 * 2, total),
                (total, total),
            ]
        );
    }

    #[tokio::test]
    async fn empty_file_yields_nothing() {
        let (callback, seen) = recorder();
        let chunks: Vec<_> = progress_stream(Vec::new(), callback).collect().await;
        assert!(chunks.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn errors_become_transport_failures() {
        let failure = TransportFailure::from(HttpError::Status(502));
        assert_eq!(failure.reason, "Request failed with status code 502");
    }
}
