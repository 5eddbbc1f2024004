//! Job status interpretation.
//!
//! Reply to state mapping:
//!
//! | Reply                                          | State   |
//! |------------------------------------------------|---------|
//! | 404                                            | Pending |
//! | 2xx, metadata absent / null / "" / empty array | Pending |
//! | 2xx, metadata decodes to records               | Ready   |
//! | 2xx, body or metadata not decodable            | Failed  |
//! | any other status                               | Failed  |
//!
//! Nothing is cached: every poll re-reads the service state, so a Ready job
//! polled again is Ready again.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cid::ContentId;
use crate::metrics;

use super::{JobFailure, JobStatus, OutputRecord, StatusReply, TranscoderBackend, TranscoderError};

/// Queries and interprets job status.
#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn TranscoderBackend>,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn TranscoderBackend>) -> Self {
        Self { backend }
    }

    /// Current status of the job for `cid`.
    ///
    /// The extension is stripped from `cid` before querying. Only transport
    /// failures are returned as errors.
    pub async fn poll(&self, cid: &ContentId) -> Result<JobStatus, TranscoderError> {
        let key = cid.job_key();
        debug!("Polling transcode status: cid={}, key={}", cid, key);

        let reply = match self.backend.fetch_status(key).await {
            Ok(reply) => reply,
            Err(e) => {
                metrics::STATUS_POLLS.with_label_values(&["error"]).inc();
                warn!("Status poll for {} failed: {}", key, e);
                return Err(e);
            }
        };

        let status = interpret_reply(reply);
        metrics::STATUS_POLLS
            .with_label_values(&[status.label()])
            .inc();

        match &status {
            JobStatus::Pending => debug!("Transcode job {} is pending", key),
            JobStatus::Ready { outputs } => {
                info!("Transcode job {} is ready ({} outputs)", key, outputs.len())
            }
            JobStatus::Failed { error } => warn!("Transcode job {} failed: {}", key, error),
        }

        Ok(status)
    }
}

/// Map a raw status reply onto a job state.
pub fn interpret_reply(reply: StatusReply) -> JobStatus {
    match reply {
        StatusReply::NotFound => JobStatus::Pending,
        StatusReply::Error { status, body } => JobStatus::Failed {
            error: JobFailure::Http { status, body },
        },
        StatusReply::Success { body } => match parse_metadata(&body) {
            Ok(Some(outputs)) => JobStatus::Ready { outputs },
            Ok(None) => JobStatus::Pending,
            Err(reason) => JobStatus::Failed {
                error: JobFailure::Parse { reason },
            },
        },
    }
}

/// Decode `{"metadata": ...}`. `Ok(None)` means nothing published yet.
fn parse_metadata(body: &str) -> Result<Option<Vec<OutputRecord>>, String> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| format!("response body is not JSON: {}", e))?;

    let metadata = match data.get("metadata") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .map_err(|e| format!("metadata is not valid JSON: {}", e))?,
        Some(inline) => inline.clone(),
    };

    let items = match metadata {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => {
            return Err(format!(
                "metadata must be an array of outputs, got {}",
                json_kind(&other)
            ))
        }
    };

    if items.is_empty() {
        return Ok(None);
    }

    let records: Vec<OutputRecord> = serde_json::from_value(Value::Array(items))
        .map_err(|e| format!("metadata entries are not output records: {}", e))?;

    Ok(Some(records))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
