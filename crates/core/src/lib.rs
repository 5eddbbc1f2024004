pub mod cid;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod storage;
pub mod testing;
pub mod transcoder;

pub use cid::{ContentId, ContentIdError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use orchestrator::{
    DownloadSummary, JobWatcher, Orchestrator, OrchestratorError, OrchestratorSettings,
    RefreshOutcome,
};
pub use resolver::{resolve, RetrievableAddress};
pub use storage::{Blob, ContentStore, PortalClient, StorageError};
pub use transcoder::{
    FormatDescriptor, HttpTranscoderClient, JobStatus, TranscodeFlags, TranscoderBackend,
    TranscoderError,
};
