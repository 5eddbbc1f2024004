//! Mock content store for testing.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cid::ContentId;
use crate::storage::{
    Blob, ContentStore, DownloadOptions, DownloadProgress, DownloadedContent, ProgressCallback,
    StorageError, UploadOptions,
};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// CID assigned to the blob.
    pub cid: ContentId,
    pub file_name: String,
    pub size: usize,
    pub encrypted: bool,
    /// When the upload happened.
    pub timestamp: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// In-memory implementation of the `ContentStore` trait.
///
/// CIDs are the SHA-256 of the bytes plus the file extension, so identical
/// unencrypted uploads get identical CIDs. Encrypted uploads mix in a random
/// nonce and get a fresh CID every time.
///
/// # Example
///
/// ```rust,ignore
/// let store = MockContentStore::new();
/// let cid = store.upload(Blob::new("a.wav", bytes), UploadOptions::default()).await?;
/// assert_eq!(store.uploads().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockContentStore {
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
    base_url: String,
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            base_url: "https://mock-portal.local/".to_string(),
        }
    }

    /// Create a mock store with a custom download base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new()
        }
    }

    /// Get all recorded uploads.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Number of blobs currently stored.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Store bytes under a chosen CID, bypassing upload.
    pub async fn insert(&self, cid: &str, bytes: Vec<u8>, content_type: Option<&str>) {
        self.blobs.write().await.insert(
            cid.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.map(String::from),
            },
        );
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<StorageError> {
        self.next_error.write().await.take()
    }

    fn derive_cid(blob: &Blob, encrypt: bool) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&blob.bytes);
        if encrypt {
            hasher.update(uuid::Uuid::new_v4().as_bytes());
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        match blob.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("z{}.{}", hex, ext),
            _ => format!("z{}", hex),
        }
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    async fn upload(&self, blob: Blob, options: UploadOptions) -> Result<ContentId, StorageError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        if blob.bytes.is_empty() {
            return Err(StorageError::InvalidInput("blob is empty".to_string()));
        }

        let raw = Self::derive_cid(&blob, options.encrypt);
        let cid = ContentId::parse(raw.as_str())
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        self.uploads.write().await.push(RecordedUpload {
            cid: cid.clone(),
            file_name: blob.file_name.clone(),
            size: blob.bytes.len(),
            encrypted: options.encrypt,
            timestamp: Utc::now(),
        });
        let content_type = blob.effective_content_type();
        self.blobs.write().await.insert(
            raw,
            StoredBlob {
                bytes: blob.bytes,
                content_type,
            },
        );

        Ok(cid)
    }

    async fn download(
        &self,
        cid: &ContentId,
        _options: DownloadOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadedContent, StorageError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }

        let stored = self
            .blobs
            .read()
            .await
            .get(cid.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(cid.to_string()))?;

        if let Some(report) = on_progress {
            let total = stored.bytes.len() as u64;
            report(DownloadProgress {
                bytes_transferred: total / 2,
                total_bytes: Some(total),
            });
            report(DownloadProgress {
                bytes_transferred: total,
                total_bytes: Some(total),
            });
        }

        Ok(DownloadedContent {
            cid: cid.clone(),
            bytes: stored.bytes,
            content_type: stored.content_type,
        })
    }

    fn download_url(&self, cid: &ContentId) -> String {
        format!("{}{}", self.base_url, cid)
    }
}
