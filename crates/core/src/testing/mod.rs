//! Testing utilities and mock implementations.
//!
//! The mocks implement the service traits in memory so the orchestrator and
//! the HTTP server can be exercised without a portal or a transcoder.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediacid_core::testing::{MockContentStore, MockTranscoder};
//!
//! let store = Arc::new(MockContentStore::new());
//! let transcoder = Arc::new(MockTranscoder::new());
//! let orchestrator = Orchestrator::new(store.clone(), transcoder.clone(), settings);
//!
//! // Drive the job from the test
//! transcoder.publish("abc", vec![fixtures::output_record("zb2", "audio/flac")]).await;
//! ```

mod mock_content_store;
mod mock_transcoder;

pub use mock_content_store::{MockContentStore, RecordedUpload};
pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::cid::ContentId;
    use crate::config::{Config, ServerConfig, StorageConfig, TranscoderConfig, WatchConfig};
    use crate::storage::Blob;
    use crate::transcoder::{FormatDescriptor, OutputRecord};

    /// An output record as the transcoder would publish it.
    pub fn output_record(cid: &str, mime_type: &str) -> OutputRecord {
        let ext = mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype.to_string());
        OutputRecord {
            cid: ContentId::parse(cid).expect("fixture CID must be valid"),
            mime_type: Some(mime_type.to_string()),
            ext,
            label: None,
            extra: serde_json::Map::new(),
        }
    }

    /// A small fake WAV blob.
    pub fn wav_blob(file_name: &str) -> Blob {
        let mut bytes = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        Blob::new(file_name, bytes).with_content_type("audio/wav")
    }

    /// VP9-in-WebM video target.
    pub fn webm_format(id: u32) -> FormatDescriptor {
        FormatDescriptor::video(id, "720p", "video/webm", "webm", "vp9")
    }

    /// A config with reasonable values for tests.
    pub fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: std::net::IpAddr::from([127, 0, 0, 1]),
                port: 8080,
                max_upload_mb: 16,
            },
            storage: StorageConfig {
                portal_url: "https://portal.example".to_string(),
                auth_token: "test-token".to_string(),
                download_base_url: "https://portal.example/".to_string(),
                default_encrypt: false,
                timeout_secs: 30,
            },
            transcoder: TranscoderConfig {
                base_url: "https://transcoder.example".to_string(),
                gpu: false,
                timeout_secs: 30,
            },
            watch: WatchConfig {
                interval_ms: 10,
                max_attempts: 5,
            },
        }
    }
}
