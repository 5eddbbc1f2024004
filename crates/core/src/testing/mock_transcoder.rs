//! Mock transcoder backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{
    OutputRecord, StatusReply, TranscodeRequest, TranscoderBackend, TranscoderError,
};

/// Mock implementation of the `TranscoderBackend` trait.
///
/// Jobs the mock has never heard of answer 404, like the real service.
/// Tests move a job along with `publish`, `fail` or `set_reply`.
///
/// # Example
///
/// ```rust,ignore
/// let transcoder = MockTranscoder::new();
/// transcoder.publish("abc", vec![fixtures::output_record("zb2", "audio/flac")]).await;
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    submissions: Arc<RwLock<Vec<TranscodeRequest>>>,
    status_queries: Arc<RwLock<Vec<String>>>,
    /// Scripted replies by job key.
    replies: Arc<RwLock<HashMap<String, StatusReply>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TranscoderError>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(RwLock::new(Vec::new())),
            status_queries: Arc::new(RwLock::new(Vec::new())),
            replies: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// All submitted job descriptions.
    pub async fn submissions(&self) -> Vec<TranscodeRequest> {
        self.submissions.read().await.clone()
    }

    /// Job keys passed to status queries, in order.
    pub async fn status_queries(&self) -> Vec<String> {
        self.status_queries.read().await.clone()
    }

    /// Total requests of either kind.
    pub async fn request_count(&self) -> usize {
        self.submissions.read().await.len() + self.status_queries.read().await.len()
    }

    /// Publish outputs for a job, encoded the way the service does it
    /// (metadata as a JSON string inside the JSON body).
    pub async fn publish(&self, job_key: &str, outputs: Vec<OutputRecord>) {
        let metadata = serde_json::to_string(&outputs).unwrap_or_else(|_| "[]".to_string());
        let body = serde_json::json!({ "metadata": metadata }).to_string();
        self.set_reply(job_key, StatusReply::Success { body }).await;
    }

    /// Make status queries for a job answer with an HTTP error.
    pub async fn fail(&self, job_key: &str, status: u16, body: &str) {
        self.set_reply(
            job_key,
            StatusReply::Error {
                status,
                body: body.to_string(),
            },
        )
        .await;
    }

    /// Script the raw reply for a job.
    pub async fn set_reply(&self, job_key: &str, reply: StatusReply) {
        self.replies
            .write()
            .await
            .insert(job_key.to_string(), reply);
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: TranscoderError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<TranscoderError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl TranscoderBackend for MockTranscoder {
    fn name(&self) -> &str {
        "mock-transcoder"
    }

    async fn submit(&self, request: &TranscodeRequest) -> Result<serde_json::Value, TranscoderError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        self.submissions.write().await.push(request.clone());
        Ok(serde_json::json!({ "queued": request.source_cid.as_str() }))
    }

    async fn fetch_status(&self, job_key: &str) -> Result<StatusReply, TranscoderError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        self.status_queries.write().await.push(job_key.to_string());

        Ok(self
            .replies
            .read()
            .await
            .get(job_key)
            .cloned()
            .unwrap_or(StatusReply::NotFound))
    }
}
