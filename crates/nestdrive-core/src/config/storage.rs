//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use: `"local"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL under which stored objects are publicly resolvable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Maximum upload size in bytes (default 1 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Chunk size used when streaming payloads (and reporting progress).
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// How many uploads of one batch may run at the same time.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            public_base_url: default_public_base_url(),
            max_upload_size_bytes: default_max_upload(),
            chunk_size_bytes: default_chunk_size(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            local: LocalStorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local object storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/objects".to_string()
}

fn default_max_upload() -> u64 {
    1_073_741_824 // 1 GB
}

fn default_chunk_size() -> usize {
    1_048_576 // 1 MB
}

fn default_max_concurrent_uploads() -> usize {
    4
}

fn default_local_root() -> String {
    "./data/objects".to_string()
}
