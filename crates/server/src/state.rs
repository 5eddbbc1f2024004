use std::sync::Arc;

use mediacid_core::{Config, JobWatcher, Orchestrator, SanitizedConfig};
use tokio::sync::broadcast;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    /// Fired once on shutdown so long-running watches return early.
    shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<Orchestrator>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            orchestrator,
            shutdown_tx,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        self.orchestrator.as_ref()
    }

    /// A watcher using the configured interval and attempt budget.
    pub fn watcher(&self) -> JobWatcher {
        JobWatcher::new(Arc::clone(&self.orchestrator), self.config.watch.clone())
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Cancel every in-flight watch.
    pub fn shutdown(&self) {
        // No receivers just means nothing is watching.
        let _ = self.shutdown_tx.send(());
    }
}
