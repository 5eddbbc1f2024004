//! Job submission.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cid::ContentId;
use crate::metrics;

use super::{
    FormatDescriptor, JobAcknowledgement, TranscodeFlags, TranscodeRequest, TranscoderBackend,
    TranscoderError,
};

/// Submits transcode jobs. Holds no state between calls.
#[derive(Clone)]
pub struct TranscodeRequester {
    backend: Arc<dyn TranscoderBackend>,
}

impl TranscodeRequester {
    pub fn new(backend: Arc<dyn TranscoderBackend>) -> Self {
        Self { backend }
    }

    /// Validate and submit a job for `source_cid`.
    ///
    /// Nothing is sent when validation fails. Re-submitting the same job is
    /// allowed.
    pub async fn submit(
        &self,
        source_cid: &ContentId,
        formats: &[FormatDescriptor],
        flags: TranscodeFlags,
    ) -> Result<JobAcknowledgement, TranscoderError> {
        if let Err(e) = validate_formats(formats) {
            metrics::TRANSCODE_SUBMISSIONS
                .with_label_values(&["invalid"])
                .inc();
            warn!("Refusing transcode request for {}: {}", source_cid, e);
            return Err(e);
        }

        let request = TranscodeRequest {
            source_cid: source_cid.clone(),
            formats: formats.to_vec(),
            flags,
        };

        match self.backend.submit(&request).await {
            Ok(body) => {
                metrics::TRANSCODE_SUBMISSIONS
                    .with_label_values(&["accepted"])
                    .inc();
                info!(
                    "Transcode job submitted to {}: source={}, formats={}, gpu={}",
                    self.backend.name(),
                    source_cid,
                    formats.len(),
                    flags.is_gpu
                );
                Ok(JobAcknowledgement {
                    source_cid: source_cid.clone(),
                    submitted_at: Utc::now(),
                    body,
                })
            }
            Err(e) => {
                metrics::TRANSCODE_SUBMISSIONS
                    .with_label_values(&["failed"])
                    .inc();
                warn!("Transcode submission for {} failed: {}", source_cid, e);
                Err(e)
            }
        }
    }
}

/// Check a batch of descriptors before submission.
pub fn validate_formats(formats: &[FormatDescriptor]) -> Result<(), TranscoderError> {
    if formats.is_empty() {
        return Err(TranscoderError::validation(
            "at least one media format is required",
        ));
    }

    let mut seen = HashSet::new();
    for format in formats {
        format.validate().map_err(TranscoderError::Validation)?;
        if !seen.insert(format.id) {
            return Err(TranscoderError::Validation(format!(
                "duplicate format id {}",
                format.id
            )));
        }
    }

    Ok(())
}
