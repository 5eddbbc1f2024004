use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{content, handlers, middleware::metrics_middleware, transcode, uploads};
use crate::state::AppState;

const MIB: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config().server.max_upload_mb as usize * MIB;

    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Upload and session
        .route("/uploads", post(uploads::upload))
        .route("/session", get(uploads::get_session))
        // Transcoding
        .route("/transcode", post(transcode::submit))
        .route("/transcode/{cid}", get(transcode::refresh))
        // Download
        .route("/content/{cid}", get(content::download))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
