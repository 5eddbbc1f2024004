//! Types for the orchestrator.

use serde::Serialize;
use thiserror::Error;

use crate::cid::ContentId;
use crate::resolver::RetrievableAddress;
use crate::storage::StorageError;
use crate::transcoder::{JobFailure, TranscoderError};

/// Errors from orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transcoder(#[from] TranscoderError),

    /// Writing downloaded bytes to the caller's sink failed.
    #[error("Failed to write downloaded content: {0}")]
    Sink(#[from] std::io::Error),

    /// An operation needed the session's active CID but nothing was uploaded yet.
    #[error("No content has been uploaded in this session")]
    NoActiveContent,

    /// A watch was stopped before the job reached a terminal state.
    #[error("Watch cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// Whether the caller may retry (with backoff).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_retryable(),
            Self::Transcoder(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result of a caller-driven status check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Try again later.
    Pending,
    /// One address per published output, in service order.
    Ready { addresses: Vec<RetrievableAddress> },
    /// Something is wrong with the job.
    Failed { error: JobFailure },
}

impl RefreshOutcome {
    /// The first address, which is "the" result when one format was requested.
    pub fn primary(&self) -> Option<&RetrievableAddress> {
        match self {
            Self::Ready { addresses } => addresses.first(),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// What a download handed to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadSummary {
    pub cid: ContentId,
    pub bytes_written: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}
