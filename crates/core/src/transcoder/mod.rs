//! Remote transcoding job protocol.
//!
//! Jobs are keyed by the source CID with its extension stripped; there is no
//! separate job id. The flow is:
//!
//! - [`TranscodeRequester`] validates format descriptors and submits a job.
//! - [`StatusPoller`] asks the service about a job and interprets the reply as
//!   `Pending`, `Ready` or `Failed`. A 404 always means `Pending`.
//!
//! Both sit on a [`TranscoderBackend`], implemented over HTTP by
//! [`HttpTranscoderClient`] and in memory by `testing::MockTranscoder`.
//!
//! # Example
//!
//! ```ignore
//! use mediacid_core::transcoder::{FormatDescriptor, HttpTranscoderClient, StatusPoller,
//!     TranscodeFlags, TranscodeRequester};
//!
//! let backend = Arc::new(HttpTranscoderClient::new(config.transcoder.clone())?);
//! let requester = TranscodeRequester::new(backend.clone());
//! let poller = StatusPoller::new(backend);
//!
//! requester
//!     .submit(&cid, &[FormatDescriptor::flac_stereo_48k()], TranscodeFlags::default())
//!     .await?;
//!
//! match poller.poll(&cid).await? {
//!     JobStatus::Pending => println!("not yet"),
//!     JobStatus::Ready { outputs } => println!("{} outputs", outputs.len()),
//!     JobStatus::Failed { error } => println!("failed: {}", error),
//! }
//! ```

mod http;
mod poller;
mod requester;
mod types;

pub use http::HttpTranscoderClient;
pub use poller::{interpret_reply, StatusPoller};
pub use requester::{validate_formats, TranscodeRequester};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the transcoding service.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// The job description was rejected locally; nothing was sent.
    #[error("Invalid transcode request: {0}")]
    Validation(String),

    /// Connection failed or the request could not be sent.
    #[error("Transcoder transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Transcoder request timed out")]
    Timeout,

    /// The service answered a submission with a non-2xx status.
    #[error("Transcoder returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The service reply could not be understood.
    #[error("Failed to parse transcoder response: {0}")]
    Parse(String),
}

impl TranscoderError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Whether the caller may retry (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for TranscoderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscoderError::Timeout
        } else {
            TranscoderError::Transport(e.to_string())
        }
    }
}

/// Transport to a transcoding service.
///
/// Implementations only move requests and replies; validation and reply
/// interpretation live in [`TranscodeRequester`] and [`StatusPoller`].
#[async_trait]
pub trait TranscoderBackend: Send + Sync {
    /// Name of this backend (for logging).
    fn name(&self) -> &str;

    /// Send a job description. Returns the acknowledgement body.
    async fn submit(&self, request: &TranscodeRequest)
        -> Result<serde_json::Value, TranscoderError>;

    /// Query the status of the job tracked under `job_key`.
    ///
    /// Only transport failures are errors; every HTTP status is a reply.
    async fn fetch_status(&self, job_key: &str) -> Result<StatusReply, TranscoderError>;
}
