//! Transcode submission and status handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mediacid_core::{
    transcoder::JobAcknowledgement, ContentId, FormatDescriptor, RefreshOutcome,
};
use serde::Deserialize;
use tracing::debug;

use super::error::ApiError;
use crate::metrics::{GaugeGuard, WATCHES_ACTIVE};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SubmitTranscodeRequest {
    /// Defaults to the session's active CID.
    #[serde(default)]
    pub cid: Option<String>,
    /// Defaults to stereo 48 kHz FLAC.
    #[serde(default)]
    pub formats: Option<Vec<FormatDescriptor>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Block until the job is terminal (bounded by the `[watch]` config).
    #[serde(default)]
    pub wait: bool,
}

/// POST /api/v1/transcode
///
/// Submit a transcode job. Returns as soon as the service accepted it.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitTranscodeRequest>,
) -> Result<(StatusCode, Json<JobAcknowledgement>), ApiError> {
    let orchestrator = state.orchestrator();

    let cid = match request.cid {
        Some(raw) => ContentId::parse(raw)?,
        None => orchestrator.require_active_cid().await?,
    };
    let formats = request
        .formats
        .unwrap_or_else(|| vec![FormatDescriptor::flac_stereo_48k()]);

    let ack = orchestrator.request_transcode(&cid, &formats).await?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

/// GET /api/v1/transcode/{cid}
///
/// Check whether the job for `cid` finished. With `?wait=true` keep polling
/// until it did, the attempt budget ran out, or the server shuts down.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshOutcome>, ApiError> {
    let cid = ContentId::parse(cid)?;

    let outcome = if params.wait {
        debug!("Watching transcode job for {}", cid);
        let _watching = GaugeGuard::new(&WATCHES_ACTIVE);
        state
            .watcher()
            .wait(&cid, state.subscribe_shutdown())
            .await?
    } else {
        state.orchestrator().refresh(&cid).await?
    };

    Ok(Json(outcome))
}
