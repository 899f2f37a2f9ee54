//! Payload placement, chunked writes, and retrieval URLs.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use nestdrive_core::config::StorageConfig;
use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::storage::{ByteStream, ObjectMeta, ObjectStore};
use nestdrive_core::types::{FileId, FolderId, OwnerId};
use nestdrive_entity::Locator;

use crate::progress::{ProgressCallback, UploadProgress};

/// Coordinates writes to an [`ObjectStore`] and produces [`Locator`]s.
#[derive(Debug, Clone)]
pub struct ObjectStoreAdapter {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    chunk_size: usize,
}

impl ObjectStoreAdapter {
    /// Create an adapter over a backend.
    pub fn new(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            chunk_size: config.chunk_size_bytes.max(1),
        }
    }

    /// The underlying backend.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Object path for a file: `{owner}/{folder_id|root}/{file_id}/{name}`.
    ///
    /// The file id segment keeps two uploads with the same name apart.
    pub fn object_path(
        owner: &OwnerId,
        folder: Option<&FolderId>,
        file_id: &FileId,
        name: &str,
    ) -> String {
        let folder = folder.map(FolderId::as_str).unwrap_or("root");
        format!("{owner}/{folder}/{file_id}/{name}")
    }

    /// Public URL an object path resolves at.
    pub fn url_for(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.public_base_url, encoded.join("/"))
    }

    /// Write a payload in chunks and return its locator.
    ///
    /// `progress` is called with monotonically increasing byte counts,
    /// ending at the payload size. If `cancel` fires or the write fails, the
    /// partially written object is removed before the error is returned.
    pub async fn put(
        &self,
        path: &str,
        data: Bytes,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> AppResult<Locator> {
        if cancel.is_cancelled() {
            return Err(AppError::cancelled(format!("Upload of {path} was cancelled")));
        }

        let total_bytes = data.len() as u64;
        let report = move |bytes_done: u64| {
            if let Some(callback) = &progress {
                callback(UploadProgress {
                    bytes_done,
                    total_bytes,
                });
            }
        };
        report(0);

        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(self.chunk_size)
            .map(|start| data.slice(start..(start + self.chunk_size).min(data.len())))
            .collect();
        let token = cancel.clone();
        let chunk_report = report.clone();
        let mut handed_off = 0u64;
        let body: ByteStream = Box::pin(stream::iter(chunks.into_iter().map(move |chunk| {
            if handed_off > 0 {
                chunk_report(handed_off);
            }
            if token.is_cancelled() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "upload cancelled",
                ));
            }
            handed_off += chunk.len() as u64;
            Ok(chunk)
        })));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Err(AppError::cancelled(format!("Upload of {path} was cancelled")))
            }
            written = self.store.put_stream(path, body) => written,
        };

        match result {
            Ok(written) => {
                report(total_bytes);
                debug!(path, bytes = written, "Stored object");
                Ok(Locator::new(path, self.url_for(path)))
            }
            Err(err) => {
                self.discard(path).await;
                if cancel.is_cancelled() {
                    Err(AppError::cancelled(format!("Upload of {path} was cancelled")))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Best-effort removal of a partially written object.
    async fn discard(&self, path: &str) {
        if let Err(e) = self.store.delete(path).await {
            warn!(path, error = %e, "Failed to remove partial object");
        }
    }

    /// Read the payload a locator points at.
    pub async fn get(&self, locator: &Locator) -> AppResult<Bytes> {
        self.store.get(&locator.path).await
    }

    /// Open the payload a locator points at as a stream.
    pub async fn read(&self, locator: &Locator) -> AppResult<ByteStream> {
        self.store.read(&locator.path).await
    }

    /// Retrieval URL for a stored object ("copy link").
    ///
    /// Fails with `NotFound` when the object is gone.
    pub async fn resolve_url(&self, locator: &Locator) -> AppResult<String> {
        if !self.store.exists(&locator.path).await? {
            return Err(AppError::not_found(format!(
                "Object not found: {}",
                locator.path
            )));
        }
        if locator.url.is_empty() {
            Ok(self.url_for(&locator.path))
        } else {
            Ok(locator.url.clone())
        }
    }

    /// Map a URL issued by this adapter back to its object path.
    pub fn path_for_url(&self, url: &str) -> AppResult<String> {
        let rest = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| AppError::validation(format!("URL is not served by this store: {url}")))?;
        let segments = rest
            .split('/')
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .map_err(|_| AppError::validation(format!("Malformed URL: {url}")))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(segments.join("/"))
    }

    /// Fetch the bytes behind a retrieval URL.
    pub async fn fetch_url(&self, url: &str) -> AppResult<Bytes> {
        let path = self.path_for_url(url)?;
        self.store.get(&path).await
    }

    /// Every object under a prefix.
    pub async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        self.store.list(prefix).await
    }

    /// Delete an object; missing objects are ignored.
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.store.delete(path).await
    }
}
