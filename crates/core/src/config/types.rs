use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload body, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    512
}

/// Content-addressed storage portal configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Portal URL uploads are sent to (e.g., "https://s5.example.org")
    pub portal_url: String,
    /// Bearer token for the portal (empty = anonymous)
    #[serde(default)]
    pub auth_token: String,
    /// Prefix a CID is appended to for downloads (e.g., "https://s5.example.org/s5/blob/")
    pub download_base_url: String,
    /// Encrypt uploads unless told otherwise
    #[serde(default)]
    pub default_encrypt: bool,
    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u32,
}

fn default_storage_timeout() -> u32 {
    300
}

/// Transcoding service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscoderConfig {
    /// Transcoder base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Ask the service to run jobs on a GPU
    #[serde(default)]
    pub gpu: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_transcoder_timeout")]
    pub timeout_secs: u32,
}

fn default_transcoder_timeout() -> u32 {
    30
}

/// Interval polling wrapper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Delay between status queries (milliseconds).
    #[serde(default = "default_watch_interval")]
    pub interval_ms: u64,
    /// Give up after this many queries (0 = unlimited).
    #[serde(default = "default_watch_attempts")]
    pub max_attempts: u32,
}

fn default_watch_interval() -> u64 {
    5000 // 5 seconds
}

fn default_watch_attempts() -> u32 {
    120
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_watch_interval(),
            max_attempts: default_watch_attempts(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub transcoder: TranscoderConfig,
    pub watch: WatchConfig,
}

/// Sanitized storage config (auth token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub portal_url: String,
    pub auth_token_configured: bool,
    pub download_base_url: String,
    pub default_encrypt: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                portal_url: config.storage.portal_url.clone(),
                auth_token_configured: !config.storage.auth_token.is_empty(),
                download_base_url: config.storage.download_base_url.clone(),
                default_encrypt: config.storage.default_encrypt,
                timeout_secs: config.storage.timeout_secs,
            },
            transcoder: config.transcoder.clone(),
            watch: config.watch.clone(),
        }
    }
}
