//! Orchestration of the upload -> transcode -> refresh -> download flow.
//!
//! The orchestrator is pull-based: nothing happens in the background, and
//! `refresh` is an explicit "is it done yet" query. `JobWatcher` layers
//! interval polling with cancellation on top for callers that want it.

mod session;
mod types;
mod watch;

pub use session::{Orchestrator, OrchestratorSettings};
pub use types::{DownloadSummary, OrchestratorError, RefreshOutcome};
pub use watch::JobWatcher;
