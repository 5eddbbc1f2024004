//! Types for the content-addressed storage layer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cid::ContentId;

/// A blob handed to the storage service.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Original file name, forwarded to the portal as the multipart file name.
    pub file_name: String,
    /// MIME type of the content, if known.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content type, guessed from the file name when not set explicitly.
    pub fn effective_content_type(&self) -> Option<String> {
        self.content_type.clone().or_else(|| {
            mime_guess::from_path(&self.file_name)
                .first()
                .map(|m| m.essence_str().to_string())
        })
    }
}

/// Options for an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Store the blob encrypted. Encrypted uploads of identical bytes do not
    /// necessarily map to the same CID.
    #[serde(default)]
    pub encrypt: bool,
}

/// Options for a download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    #[serde(default)]
    pub encrypt: bool,
}

/// Progress snapshot reported while a download is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes received so far.
    pub bytes_transferred: u64,
    /// Total size, when the service announced one.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Rounded completion percentage, if the total is known.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(0) => Some(100),
            Some(total) => {
                let pct = (self.bytes_transferred as f64 * 100.0 / total as f64).round();
                Some(pct.clamp(0.0, 100.0) as u8)
            }
            None => None,
        }
    }
}

/// Observer invoked with progress updates during a download.
///
/// Observers only report; they must not drive orchestration state.
pub type ProgressCallback = dyn Fn(DownloadProgress) + Send + Sync;

/// Progress observer that logs at debug level.
pub fn log_progress(progress: DownloadProgress) {
    match progress.percent() {
        Some(pct) => debug!("Download progress: {}%", pct),
        None => debug!(
            "Download progress: {} bytes",
            progress.bytes_transferred
        ),
    }
}

/// Bytes retrieved from storage.
#[derive(Debug, Clone)]
pub struct DownloadedContent {
    pub cid: ContentId,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl DownloadedContent {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
