//! Content-addressed storage abstraction.
//!
//! This module provides a `ContentStore` trait for moving blobs in and out of
//! a storage service that names them by content identifier, and
//! `PortalClient`, the HTTP implementation for S5-style portals.

mod portal;
mod types;

pub use portal::PortalClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::cid::ContentId;

/// Errors that can occur when talking to the storage service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection failed or the request could not be sent.
    #[error("Storage transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Storage request timed out")]
    Timeout,

    /// The service refused the request.
    #[error("Storage service rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// No blob stored under this CID.
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The service reply could not be understood.
    #[error("Failed to parse storage response: {0}")]
    Parse(String),

    /// The request was malformed before it was sent.
    #[error("Invalid storage request: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// Whether the caller may retry (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StorageError::Timeout
        } else {
            StorageError::Transport(e.to_string())
        }
    }
}

/// A storage backend addressed by content identifiers.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of this backend (for logging).
    fn name(&self) -> &str;

    /// Store a blob and return the identifier the service assigned to it.
    async fn upload(&self, blob: Blob, options: UploadOptions) -> Result<ContentId, StorageError>;

    /// Fetch the bytes stored under `cid`.
    ///
    /// `on_progress` is called as data arrives; completion does not depend on it.
    async fn download(
        &self,
        cid: &ContentId,
        options: DownloadOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadedContent, StorageError>;

    /// Address the blob stored under `cid` can be fetched from.
    fn download_url(&self, cid: &ContentId) -> String;
}
