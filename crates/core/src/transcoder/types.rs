//! Types for the transcoding job protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cid::ContentId;

/// A desired output of a transcode job, in the shape the service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Numeric format id (unique within one submission).
    pub id: u32,
    /// Human readable label (e.g., "1600k").
    pub label: String,
    /// MIME type of the output (e.g., "audio/flac").
    #[serde(rename = "type")]
    pub mime_type: String,
    /// File extension of the output, without the dot.
    pub ext: String,
    /// Audio codec name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    /// Video codec name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    /// Audio channel count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ch: Option<u32>,
    /// Audio sample rate, either plain Hz ("44100") or with a k suffix ("48k").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,
}

impl FormatDescriptor {
    /// Audio output descriptor.
    pub fn audio(
        id: u32,
        label: impl Into<String>,
        mime_type: impl Into<String>,
        ext: impl Into<String>,
        acodec: impl Into<String>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            mime_type: mime_type.into(),
            ext: ext.into(),
            acodec: Some(acodec.into()),
            vcodec: None,
            ch: None,
            ar: None,
        }
    }

    /// Video output descriptor.
    pub fn video(
        id: u32,
        label: impl Into<String>,
        mime_type: impl Into<String>,
        ext: impl Into<String>,
        vcodec: impl Into<String>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            mime_type: mime_type.into(),
            ext: ext.into(),
            acodec: None,
            vcodec: Some(vcodec.into()),
            ch: None,
            ar: None,
        }
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.ch = Some(channels);
        self
    }

    pub fn with_sample_rate(mut self, rate: impl Into<String>) -> Self {
        self.ar = Some(rate.into());
        self
    }

    /// Stereo 48 kHz FLAC, the default audio target.
    pub fn flac_stereo_48k() -> Self {
        Self::audio(16, "1600k", "audio/flac", "flac", "flac")
            .with_channels(2)
            .with_sample_rate("48k")
    }

    /// Sample rate in Hz, if set and well formed.
    pub fn sample_rate_hz(&self) -> Option<u32> {
        self.ar.as_deref().and_then(parse_rate)
    }

    /// Check the descriptor is well formed.
    pub fn validate(&self) -> Result<(), String> {
        if self.mime_type.trim().is_empty() || !self.mime_type.contains('/') {
            return Err(format!(
                "format {}: type '{}' is not a MIME type",
                self.id, self.mime_type
            ));
        }
        if self.ext.trim().is_empty() {
            return Err(format!("format {}: ext cannot be empty", self.id));
        }
        if self.ch == Some(0) {
            return Err(format!("format {}: ch must be positive", self.id));
        }
        if let Some(ref ar) = self.ar {
            if parse_rate(ar).is_none() {
                return Err(format!(
                    "format {}: ar '{}' is not a positive sample rate",
                    self.id, ar
                ));
            }
        }
        Ok(())
    }
}

/// Parse a rate such as "48k", "44.1k" or "44100" into Hz.
pub fn parse_rate(value: &str) -> Option<u32> {
    let value = value.trim().to_ascii_lowercase();
    let (number, multiplier) = match value.strip_suffix('k') {
        Some(n) => (n, 1000.0),
        None => (value.as_str(), 1.0),
    };
    let parsed: f64 = number.trim().parse().ok()?;
    let hz = (parsed * multiplier).round();
    if hz.is_finite() && hz >= 1.0 && hz <= u32::MAX as f64 {
        Some(hz as u32)
    } else {
        None
    }
}

/// Flags forwarded with a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeFlags {
    /// The source blob is stored encrypted.
    #[serde(default)]
    pub is_encrypted: bool,
    /// Run the job on a GPU.
    #[serde(default)]
    pub is_gpu: bool,
}

/// A validated job description, as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub source_cid: ContentId,
    pub formats: Vec<FormatDescriptor>,
    pub flags: TranscodeFlags,
}

impl TranscodeRequest {
    /// The `media_formats` query value.
    pub fn media_formats_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.formats)
    }
}

/// The service accepted a job description. Says nothing about completion.
#[derive(Debug, Clone, Serialize)]
pub struct JobAcknowledgement {
    pub source_cid: ContentId,
    pub submitted_at: DateTime<Utc>,
    /// Reply body from the service (`null` when empty).
    pub body: serde_json::Value,
}

/// One transcoded output reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// CID of the transcoded artifact.
    pub cid: ContentId,
    /// Realized MIME type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Realized file extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Any further service-assigned fields (id, codec, channels, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Why a job is reported as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobFailure {
    /// Non-2xx status other than 404.
    #[error("Transcoder returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Metadata was present but could not be decoded.
    #[error("Unparseable transcode metadata: {reason}")]
    Parse { reason: String },
}

impl JobFailure {
    /// HTTP status code, when the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Parse { .. } => None,
        }
    }
}

/// Observed state of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// No result yet. Includes "the service has never heard of this job".
    Pending,
    /// Outputs are published. Never empty.
    Ready { outputs: Vec<OutputRecord> },
    /// The service reported an error.
    Failed { error: JobFailure },
}

impl JobStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Raw reply to a status query, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReply {
    /// HTTP 404.
    NotFound,
    /// HTTP 2xx with the response body.
    Success { body: String },
    /// Any other status.
    Error { status: u16, body: String },
}
