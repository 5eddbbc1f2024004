//! End-to-end flow: upload, submit, refresh, download.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cid::ContentId;
use crate::config::Config;
use crate::resolver::resolve;
use crate::storage::{
    Blob, ContentStore, DownloadOptions, DownloadedContent, PortalClient, ProgressCallback,
    UploadOptions,
};
use crate::transcoder::{
    FormatDescriptor, HttpTranscoderClient, JobAcknowledgement, JobStatus, StatusPoller,
    TranscodeFlags, TranscodeRequester, TranscoderBackend,
};

use super::{DownloadSummary, OrchestratorError, RefreshOutcome};

/// Settings the orchestrator needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Prefix transcoded CIDs are appended to.
    pub download_base_url: String,
    /// Store uploads encrypted and tell the transcoder the source is encrypted.
    pub encrypt: bool,
    /// Ask for GPU transcoding.
    pub gpu: bool,
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            download_base_url: config.storage.download_base_url.clone(),
            encrypt: config.storage.default_encrypt,
            gpu: config.transcoder.gpu,
        }
    }
}

/// Composes storage, submission, polling and resolution.
///
/// All job state lives in the services and is keyed by CID. The only local
/// state is the session's active CID.
pub struct Orchestrator {
    store: Arc<dyn ContentStore>,
    requester: TranscodeRequester,
    poller: StatusPoller,
    settings: OrchestratorSettings,
    active_cid: RwLock<Option<ContentId>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        transcoder: Arc<dyn TranscoderBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            requester: TranscodeRequester::new(Arc::clone(&transcoder)),
            poller: StatusPoller::new(transcoder),
            settings,
            active_cid: RwLock::new(None),
        }
    }

    /// Build an orchestrator talking to the configured portal and transcoder.
    pub fn from_config(config: &Config) -> Result<Self, OrchestratorError> {
        let store = PortalClient::new(config.storage.clone())?;
        let transcoder = HttpTranscoderClient::new(config.transcoder.clone())?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(transcoder),
            OrchestratorSettings::from(config),
        ))
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// CID of the most recent successful upload in this session.
    pub async fn active_cid(&self) -> Option<ContentId> {
        self.active_cid.read().await.clone()
    }

    /// The active CID, or `NoActiveContent`.
    pub async fn require_active_cid(&self) -> Result<ContentId, OrchestratorError> {
        self.active_cid()
            .await
            .ok_or(OrchestratorError::NoActiveContent)
    }

    /// Upload a blob and make its CID the active one.
    pub async fn start_upload(&self, blob: Blob) -> Result<ContentId, OrchestratorError> {
        let options = UploadOptions {
            encrypt: self.settings.encrypt,
        };
        let cid = self.store.upload(blob, options).await?;

        *self.active_cid.write().await = Some(cid.clone());
        info!("Active content is now {}", cid);
        Ok(cid)
    }

    /// Submit a transcode job. Returns once the service accepted it.
    pub async fn request_transcode(
        &self,
        cid: &ContentId,
        formats: &[FormatDescriptor],
    ) -> Result<JobAcknowledgement, OrchestratorError> {
        let flags = TranscodeFlags {
            is_encrypted: self.settings.encrypt,
            is_gpu: self.settings.gpu,
        };
        Ok(self.requester.submit(cid, formats, flags).await?)
    }

    /// Check once whether the job for `cid` is done.
    pub async fn refresh(&self, cid: &ContentId) -> Result<RefreshOutcome, OrchestratorError> {
        let outcome = match self.poller.poll(cid).await? {
            JobStatus::Pending => RefreshOutcome::Pending,
            JobStatus::Ready { outputs } => RefreshOutcome::Ready {
                addresses: resolve(&outputs, &self.settings.download_base_url),
            },
            JobStatus::Failed { error } => RefreshOutcome::Failed { error },
        };

        if let Some(address) = outcome.primary() {
            debug!("Transcoded {} available at {}", cid, address);
        }
        Ok(outcome)
    }

    /// Fetch the bytes stored under `cid`.
    pub async fn fetch(
        &self,
        cid: &ContentId,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadedContent, OrchestratorError> {
        let options = DownloadOptions {
            encrypt: self.settings.encrypt,
        };
        Ok(self.store.download(cid, options, on_progress).await?)
    }

    /// Download `cid` and hand the bytes to `sink`.
    pub async fn download<W>(
        &self,
        cid: &ContentId,
        sink: &mut W,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<DownloadSummary, OrchestratorError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let content = self.fetch(cid, on_progress).await?;

        sink.write_all(&content.bytes).await?;
        sink.flush().await?;

        Ok(DownloadSummary {
            cid: content.cid,
            bytes_written: content.bytes.len() as u64,
            content_type: content.content_type,
        })
    }

    /// Where the blob under `cid` can be fetched from directly.
    pub fn download_url(&self, cid: &ContentId) -> String {
        self.store.download_url(cid)
    }
}
