//! Object store trait for pluggable binary payload backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Path of the object within the store.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A byte stream type used for reading and writing object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for object storage backends.
///
/// Paths are opaque `/`-separated strings. The store is not transactionally
/// linked to the metadata database; callers coordinate the two.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a complete payload, replacing any existing object at `path`.
    async fn put(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Write a payload from a stream and return the number of bytes written.
    ///
    /// If the stream yields an error the write is aborted; the partially
    /// written object may remain and must be deleted by the caller.
    async fn put_stream(&self, path: &str, stream: ByteStream) -> AppResult<u64>;

    /// Read a complete object into memory.
    async fn get(&self, path: &str) -> AppResult<Bytes>;

    /// Open an object as a byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Check whether an object exists.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Enumerate every object under a prefix, recursively, sorted by path.
    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;
}
