//! S5 portal storage client.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, multipart, Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cid::ContentId;
use crate::config::StorageConfig;
use crate::metrics;

use super::{
    Blob, ContentStore, DownloadOptions, DownloadProgress, DownloadedContent, ProgressCallback,
    StorageError, UploadOptions,
};

/// Upper bound on what `Content-Length` may reserve before any body arrives.
const MAX_PREALLOCATED_BYTES: u64 = 8 * 1024 * 1024;

/// Storage client for an S5 portal.
pub struct PortalClient {
    client: Client,
    config: StorageConfig,
}

impl PortalClient {
    /// Create a new portal client.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the portal URL without trailing slash.
    fn portal_url(&self) -> &str {
        self.config.portal_url.trim_end_matches('/')
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.config.auth_token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.auth_token)
        }
    }

    /// Send a download request and collect the body, reporting progress per chunk.
    async fn fetch(
        &self,
        cid: &ContentId,
        request: RequestBuilder,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadedContent, StorageError> {
        let response = request.send().await?;

        let status = response.status();
        if status == 404 {
            return Err(StorageError::NotFound(cid.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let total_bytes = response.content_length();

        let reserve = total_bytes.map_or(0, |n| n.min(MAX_PREALLOCATED_BYTES)) as usize;
        let mut bytes = Vec::with_capacity(reserve);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            bytes.extend_from_slice(&chunk);
            if let Some(callback) = on_progress {
                callback(DownloadProgress {
                    bytes_transferred: bytes.len() as u64,
                    total_bytes,
                });
            }
        }

        Ok(DownloadedContent {
            cid: cid.clone(),
            bytes,
            content_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    cid: Option<String>,
    #[serde(rename = "encryptedBlobUrl")]
    encrypted_blob_url: Option<String>,
}

#[async_trait]
impl ContentStore for PortalClient {
    fn name(&self) -> &str {
        "s5-portal"
    }

    async fn upload(&self, blob: Blob, options: UploadOptions) -> Result<ContentId, StorageError> {
        let url = format!("{}/s5/upload", self.portal_url());
        let size = blob.bytes.len();
        let content_type = blob.effective_content_type();

        debug!(
            "Portal upload: url={}, file={}, size={}, encrypt={}",
            url, blob.file_name, size, options.encrypt
        );

        let mut part = multipart::Part::bytes(blob.bytes).file_name(blob.file_name.clone());
        if let Some(ct) = content_type {
            part = part
                .mime_str(&ct)
                .map_err(|e| StorageError::InvalidInput(format!("content type '{}': {}", ct, e)))?;
        }
        let form = multipart::Form::new().part("file", part);

        let mut request = self.authorize(self.client.post(&url)).multipart(form);
        if options.encrypt {
            request = request.query(&[("encrypt", "true")]);
        }

        let timer = metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["storage", "upload"])
            .start_timer();
        let response = request.send().await;
        timer.observe_duration();

        let response = response.map_err(|e| {
            metrics::UPLOADS_TOTAL.with_label_values(&["transport_error"]).inc();
            StorageError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Portal rejected upload of {}: HTTP {}", blob.file_name, status);
            metrics::UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let reply: UploadReply = response.json().await.map_err(|e| {
            StorageError::Parse(format!("Failed to parse upload response: {}", e))
        })?;

        if let Some(ref blob_url) = reply.encrypted_blob_url {
            debug!("Portal upload: encryptedBlobUrl={}", blob_url);
        }

        let cid = reply
            .cid
            .ok_or_else(|| StorageError::Parse("Upload response has no cid".to_string()))
            .and_then(|raw| {
                ContentId::parse(raw).map_err(|e| StorageError::Parse(e.to_string()))
            })?;

        metrics::UPLOADS_TOTAL.with_label_values(&["success"]).inc();
        info!("Uploaded {} ({} bytes) as {}", blob.file_name, size, cid);
        Ok(cid)
    }

    async fn download(
        &self,
        cid: &ContentId,
        options: DownloadOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadedContent, StorageError> {
        let url = self.download_url(cid);
        debug!("Portal download: url={}, encrypt={}", url, options.encrypt);

        let mut request = self.authorize(self.client.get(&url));
        if options.encrypt {
            request = request.query(&[("encrypt", "true")]);
        }

        let timer = metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["storage", "download"])
            .start_timer();
        let result = self.fetch(cid, request, on_progress).await;
        timer.observe_duration();

        match &result {
            Ok(content) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
                info!("Downloaded {} ({} bytes)", cid, content.len());
            }
            Err(StorageError::NotFound(_)) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["not_found"]).inc();
                warn!("Content {} not found on portal", cid);
            }
            Err(e) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                warn!("Download of {} failed: {}", cid, e);
            }
        }

        result
    }

    fn download_url(&self, cid: &ContentId) -> String {
        format!("{}{}", self.config.download_base_url, cid)
    }
}
