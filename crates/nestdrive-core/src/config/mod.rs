//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod auth;
pub mod database;
pub mod logging;
pub mod namespace;
pub mod realtime;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::namespace::{DeletePolicy, NamespaceConfig};
pub use self::realtime::RealtimeConfig;
pub use self::storage::{LocalStorageConfig, StorageConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay). Every
/// section falls back to its defaults, so an empty configuration is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Namespace rules (deletion policy, id generation).
    #[serde(default)]
    pub namespace: NamespaceConfig,
    /// Live query settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Identity provider settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `NESTDRIVE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit configuration directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("NESTDRIVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject settings that would make the system misbehave at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.storage.chunk_size_bytes == 0 {
            return Err(AppError::configuration("storage.chunk_size_bytes must be > 0"));
        }
        if self.storage.max_concurrent_uploads == 0 {
            return Err(AppError::configuration(
                "storage.max_concurrent_uploads must be > 0",
            ));
        }
        if self.namespace.id_generation_attempts == 0 {
            return Err(AppError::configuration(
                "namespace.id_generation_attempts must be > 0",
            ));
        }
        if self.worker.reconcile_interval_seconds == 0 {
            return Err(AppError::configuration(
                "worker.reconcile_interval_seconds must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.namespace.delete_policy, DeletePolicy::Cascade);
    }

    #[test]
    fn test_load_from_toml_overlay() {
        let dir = tempfile_dir();
        std::fs::write(
            dir.join("default.toml"),
            "[namespace]\ndelete_policy = \"reject_non_empty\"\n[storage]\nchunk_size_bytes = 4\n",
        )
        .expect("write default.toml");

        let config = AppConfig::load_from(dir.to_str().expect("utf-8 path"), "test")
            .expect("config should load");
        assert_eq!(config.namespace.delete_policy, DeletePolicy::RejectNonEmpty);
        assert_eq!(config.storage.chunk_size_bytes, 4);
        assert_eq!(config.worker.orphan_grace_seconds, 300);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.storage.chunk_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nestdrive-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }
}
