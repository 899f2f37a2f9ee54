//! # nestdrive-storage
//!
//! Object store backends for file payloads and the adapter that turns a
//! payload into a [`Locator`](nestdrive_entity::Locator): chunked writes with
//! progress and cancellation, retrieval URLs, and cleanup of partial objects.

pub mod adapter;
pub mod mime;
pub mod progress;
pub mod providers;

pub use adapter::ObjectStoreAdapter;
pub use progress::{ProgressCallback, UploadProgress};
pub use providers::{LocalObjectStore, MemoryObjectStore};

use std::sync::Arc;

use nestdrive_core::config::StorageConfig;
use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::ObjectStore;

/// Build the object store backend selected by configuration.
pub async fn open_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(
            LocalObjectStore::new(&config.local.root_path).await?,
        )),
        "memory" => Ok(Arc::new(MemoryObjectStore::new())),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider '{other}'"
        ))),
    }
}
