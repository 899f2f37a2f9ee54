//! In-memory object store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::storage::{ByteStream, ObjectMeta, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

/// Object store holding every payload in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with an explicit modification time.
    pub async fn put_at(&self, path: &str, data: Bytes, last_modified: DateTime<Utc>) {
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                data,
                last_modified,
            },
        );
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.put_at(path, data, Utc::now()).await;
        Ok(())
    }

    async fn put_stream(&self, path: &str, mut stream: ByteStream) -> AppResult<u64> {
        let mut buffer = BytesMut::new();
        // Partial writes stay visible, mirroring a filesystem backend.
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => buffer.extend_from_slice(&chunk),
                Err(e) => {
                    self.put_at(path, buffer.freeze(), Utc::now()).await;
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        "Stream read error",
                        e,
                    ));
                }
            }
        }
        let total = buffer.len() as u64;
        self.put_at(path, buffer.freeze(), Utc::now()).await;
        Ok(total)
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {path}")))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self.get(path).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.objects.read().await.contains_key(path))
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, object)| ObjectMeta {
                path: path.clone(),
                size_bytes: object.data.len() as u64,
                last_modified: Some(object.last_modified),
            })
            .collect())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.objects.write().await.remove(path);
        Ok(())
    }
}
