//! Mapping from orchestrator errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediacid_core::{ContentIdError, OrchestratorError, StorageError, TranscoderError};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ContentIdError> for ApiError {
    fn from(e: ContentIdError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        let status = match &e {
            OrchestratorError::NoActiveContent => StatusCode::BAD_REQUEST,
            OrchestratorError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            OrchestratorError::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrchestratorError::Storage(storage) => match storage {
                StorageError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                StorageError::Transport(_)
                | StorageError::Rejected { .. }
                | StorageError::Parse(_) => StatusCode::BAD_GATEWAY,
            },
            OrchestratorError::Transcoder(transcoder) => match transcoder {
                TranscoderError::Validation(_) => StatusCode::BAD_REQUEST,
                TranscoderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                TranscoderError::Transport(_)
                | TranscoderError::Http { .. }
                | TranscoderError::Parse(_) => StatusCode::BAD_GATEWAY,
            },
        };

        if status.is_server_error() {
            warn!("Request failed: {}", e);
        }
        Self::new(status, e.to_string())
    }
}
