//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Storage (uploads, downloads)
//! - Transcoding (submissions, status polls by outcome)
//! - External services (request latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Storage Metrics
// =============================================================================

/// Uploads total by result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediacid_uploads_total", "Total uploads to the storage portal"),
        &["result"], // "success", "rejected", "transport_error"
    )
    .unwrap()
});

/// Downloads total by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacid_downloads_total",
            "Total downloads from the storage portal",
        ),
        &["result"], // "success", "not_found", "failed"
    )
    .unwrap()
});

// =============================================================================
// Transcoding Metrics
// =============================================================================

/// Transcode submissions total by result.
pub static TRANSCODE_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacid_transcode_submissions_total",
            "Total transcode job submissions",
        ),
        &["result"], // "accepted", "invalid", "failed"
    )
    .unwrap()
});

/// Status polls total by observed outcome.
pub static STATUS_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediacid_status_polls_total",
            "Total transcode status polls",
        ),
        &["outcome"], // "pending", "ready", "failed", "error"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediacid_external_service_duration_seconds",
            "Duration of external service requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0]),
        &["service", "operation"], // service: "storage", "transcoder"
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Storage
        Box::new(UPLOADS_TOTAL.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        // Transcoding
        Box::new(TRANSCODE_SUBMISSIONS.clone()),
        Box::new(STATUS_POLLS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
    ]
}
