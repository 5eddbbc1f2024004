//! Upload and session handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use mediacid_core::{Blob, ContentId};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub cid: ContentId,
    /// Where the uploaded blob can be fetched from directly.
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub active_cid: Option<ContentId>,
}

/// POST /api/v1/uploads
///
/// Upload the multipart field `file` and make it the session's active content.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut blob: Option<Blob> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;

        let mut parsed = Blob::new(file_name, bytes.to_vec());
        if let Some(ct) = content_type {
            parsed = parsed.with_content_type(ct);
        }
        blob = Some(parsed);
    }

    let blob = blob.ok_or_else(|| ApiError::bad_request("Missing multipart field 'file'"))?;
    info!(
        "Received upload '{}' ({} bytes)",
        blob.file_name,
        blob.bytes.len()
    );

    let orchestrator = state.orchestrator();
    let cid = orchestrator.start_upload(blob).await?;
    let download_url = orchestrator.download_url(&cid);

    Ok((StatusCode::CREATED, Json(UploadResponse { cid, download_url })))
}

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(SessionResponse {
        active_cid: state.orchestrator().active_cid().await,
    })
}
