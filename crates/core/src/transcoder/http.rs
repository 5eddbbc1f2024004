//! HTTP transcoding service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::TranscoderConfig;
use crate::metrics;

use super::{StatusReply, TranscodeRequest, TranscoderBackend, TranscoderError};

/// Client for the transcoding service's HTTP API.
pub struct HttpTranscoderClient {
    client: Client,
    config: TranscoderConfig,
}

impl HttpTranscoderClient {
    /// Create a new transcoder client.
    pub fn new(config: TranscoderConfig) -> Result<Self, TranscoderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn status_url(&self, job_key: &str) -> String {
        format!(
            "{}/get_transcoded/{}",
            self.base_url(),
            urlencoding::encode(job_key)
        )
    }
}

#[async_trait]
impl TranscoderBackend for HttpTranscoderClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(
        &self,
        request: &TranscodeRequest,
    ) -> Result<serde_json::Value, TranscoderError> {
        let url = format!("{}/transcode", self.base_url());
        let media_formats = request
            .media_formats_json()
            .map_err(|e| TranscoderError::Validation(format!("media formats: {}", e)))?;

        debug!(
            "Transcoder submit: url={}, source_cid={}, media_formats={}",
            url, request.source_cid, media_formats
        );

        let timer = metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["transcoder", "submit"])
            .start_timer();
        let response = self
            .client
            .post(&url)
            .query(&[
                ("source_cid", request.source_cid.as_str()),
                ("media_formats", media_formats.as_str()),
                (
                    "is_encrypted",
                    if request.flags.is_encrypted { "true" } else { "false" },
                ),
                ("is_gpu", if request.flags.is_gpu { "true" } else { "false" }),
            ])
            .send()
            .await;
        timer.observe_duration();
        let response = response?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TranscoderError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!("Transcoder submit reply: {}", body);

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            TranscoderError::Parse(format!("Failed to parse transcode acknowledgement: {}", e))
        })
    }

    async fn fetch_status(&self, job_key: &str) -> Result<StatusReply, TranscoderError> {
        let url = self.status_url(job_key);
        debug!("Transcoder status: url={}", url);

        let timer = metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["transcoder", "status"])
            .start_timer();
        let response = self.client.get(&url).send().await;
        timer.observe_duration();
        let response = response?;

        let status = response.status();
        if status == 404 {
            return Ok(StatusReply::NotFound);
        }

        let body = response.text().await?;
        if status.is_success() {
            Ok(StatusReply::Success { body })
        } else {
            debug!("Transcoder status HTTP {} for {}", status, job_key);
            Ok(StatusReply::Error {
                status: status.as_u16(),
                body,
            })
        }
    }
}
