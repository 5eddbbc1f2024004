//! Interval polling on top of `Orchestrator::refresh`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::cid::ContentId;
use crate::config::WatchConfig;

use super::{Orchestrator, OrchestratorError, RefreshOutcome};

/// Repeats `refresh` until the job is terminal, the attempt budget runs out,
/// or a shutdown signal arrives.
pub struct JobWatcher {
    orchestrator: Arc<Orchestrator>,
    config: WatchConfig,
}

impl JobWatcher {
    pub fn new(orchestrator: Arc<Orchestrator>, config: WatchConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Wait for the job behind `cid`.
    ///
    /// Returns the terminal outcome, or `Pending` when `max_attempts` queries
    /// were made without one. A message on (or closing of) `shutdown_rx`
    /// yields `Cancelled`. Transport errors are returned immediately.
    pub async fn wait(
        &self,
        cid: &ContentId,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<RefreshOutcome, OrchestratorError> {
        let mut attempts: u32 = 0;

        loop {
            let outcome = self.orchestrator.refresh(cid).await?;
            attempts += 1;

            if outcome.is_terminal() {
                info!("Watch on {} finished after {} polls", cid, attempts);
                return Ok(outcome);
            }
            if self.config.max_attempts != 0 && attempts >= self.config.max_attempts {
                info!(
                    "Watch on {} gave up after {} polls, job still pending",
                    cid, attempts
                );
                return Ok(outcome);
            }

            debug!(
                "Job {} still pending, next poll in {}ms",
                cid, self.config.interval_ms
            );

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Watch on {} received shutdown signal", cid);
                    return Err(OrchestratorError::Cancelled);
                }
                _ = tokio::time::sleep(Duration::from_millis(self.config.interval_ms)) => {}
            }
        }
    }
}
