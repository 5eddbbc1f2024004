//! Content download handler.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use mediacid_core::{storage::log_progress, ContentId};

use super::error::ApiError;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// GET /api/v1/content/{cid}
///
/// Fetch the blob stored under `cid` and return its bytes.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Response, ApiError> {
    let cid = ContentId::parse(cid)?;

    let mut body = Vec::new();
    let summary = state
        .orchestrator()
        .download(&cid, &mut body, Some(&log_progress))
        .await?;

    let content_type = summary
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
