//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use nestdrive_core::config::AppConfig;
use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::storage::{ByteStream, ObjectMeta, ObjectStore};
use nestdrive_core::types::{FileId, FolderId, OwnerId};
use nestdrive_database::{MemoryNamespaceStore, NamespaceStore};
use nestdrive_entity::{File, Folder};
use nestdrive_service::{AppState, SessionContext};
use nestdrive_storage::MemoryObjectStore;

/// Test application context
pub struct TestApp {
    /// Wired services
    pub state: AppState,
    /// Namespace store wrapper with failure switches
    pub store: Arc<FlakyStore>,
    /// Object store wrapper with failure switches
    pub objects: Arc<FlakyObjects>,
}

impl TestApp {
    /// Create a test application with in-process backends
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with the given configuration
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(FlakyStore::new(Arc::new(MemoryNamespaceStore::new())));
        let objects = Arc::new(FlakyObjects::new(Arc::new(MemoryObjectStore::new())));
        let state = AppState::with_backends(config, store.clone(), objects.clone());
        Self {
            state,
            store,
            objects,
        }
    }

    /// Session context for an owner
    pub fn ctx(&self, owner: &str) -> SessionContext {
        SessionContext::new(OwnerId::parse(owner).expect("owner id"))
    }

    /// Number of stored objects
    pub async fn object_count(&self) -> usize {
        self.objects.inner.len().await
    }
}

/// Bound a future so a broken live query fails the test instead of hanging.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

/// Namespace store that can be told to fail file writes.
#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<dyn NamespaceStore>,
    /// Fail `insert_file`
    pub fail_file_inserts: AtomicBool,
    /// Fail `delete_file`
    pub fail_file_deletes: AtomicBool,
}

impl FlakyStore {
    fn new(inner: Arc<dyn NamespaceStore>) -> Self {
        Self {
            inner,
            fail_file_inserts: AtomicBool::new(false),
            fail_file_deletes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl NamespaceStore for FlakyStore {
    fn store_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn insert_folder(&self, folder: &Folder) -> AppResult<()> {
        self.inner.insert_folder(folder).await
    }

    async fn insert_file(&self, file: &File) -> AppResult<()> {
        if self.fail_file_inserts.load(Ordering::SeqCst) {
            return Err(AppError::database("injected insert failure"));
        }
        self.inner.insert_file(file).await
    }

    async fn find_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>> {
        self.inner.find_folder(owner, id).await
    }

    async fn find_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>> {
        self.inner.find_file(owner, id).await
    }

    async fn list_folders(
        &self,
        owner: &OwnerId,
        parent: Option<&FolderId>,
    ) -> AppResult<Vec<Folder>> {
        self.inner.list_folders(owner, parent).await
    }

    async fn list_files(&self, owner: &OwnerId, folder: Option<&FolderId>) -> AppResult<Vec<File>> {
        self.inner.list_files(owner, folder).await
    }

    async fn list_all_folders(&self, owner: &OwnerId) -> AppResult<Vec<Folder>> {
        self.inner.list_all_folders(owner).await
    }

    async fn list_all_files(&self, owner: &OwnerId) -> AppResult<Vec<File>> {
        self.inner.list_all_files(owner).await
    }

    async fn list_owners(&self) -> AppResult<Vec<OwnerId>> {
        self.inner.list_owners().await
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<()> {
        self.inner.update_folder(folder).await
    }

    async fn update_file(&self, file: &File) -> AppResult<()> {
        self.inner.update_file(file).await
    }

    async fn delete_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool> {
        self.inner.delete_folder(owner, id).await
    }

    async fn delete_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool> {
        if self.fail_file_deletes.load(Ordering::SeqCst) {
            return Err(AppError::database("injected delete failure"));
        }
        self.inner.delete_file(owner, id).await
    }
}

/// Object store that can be told to fail deletes.
#[derive(Debug)]
pub struct FlakyObjects {
    /// The wrapped store
    pub inner: Arc<MemoryObjectStore>,
    /// Fail `delete`
    pub fail_deletes: AtomicBool,
}

impl FlakyObjects {
    fn new(inner: Arc<MemoryObjectStore>) -> Self {
        Self {
            inner,
            fail_deletes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyObjects {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.put(path, data).await
    }

    async fn put_stream(&self, path: &str, stream: ByteStream) -> AppResult<u64> {
        self.inner.put_stream(path, stream).await
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        self.inner.get(path).await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        self.inner.list(prefix).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected delete failure"));
        }
        self.inner.delete(path).await
    }
}
