//! Shared application state: every backend and service, wired once.

use std::sync::Arc;

use nestdrive_core::config::AppConfig;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::{NamespaceObserver, ObjectStore};
use nestdrive_database::NamespaceStore;
use nestdrive_realtime::{EventBridge, LiveQueryEngine};
use nestdrive_storage::ObjectStoreAdapter;
use tracing::info;

use crate::file::{FileService, UploadService};
use crate::folder::FolderService;
use crate::reconcile::Reconciler;

/// Application state containing all shared dependencies.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Namespace store (SQLite or in-process)
    pub store: Arc<dyn NamespaceStore>,
    /// Object store adapter
    pub objects: ObjectStoreAdapter,
    /// Live query engine
    pub engine: Arc<LiveQueryEngine>,

    // ── Services ─────────────────────────────────────────────
    /// Folder service
    pub folders: Arc<FolderService>,
    /// File service
    pub files: Arc<FileService>,
    /// Upload service
    pub uploads: Arc<UploadService>,
    /// Store reconciliation
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    /// Open the configured backends and wire the services.
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let store = nestdrive_database::open_store(&config.database).await?;
        let objects = nestdrive_storage::open_object_store(&config.storage).await?;
        Ok(Self::with_backends(config, store, objects))
    }

    /// Wire the services over already-open backends.
    pub fn with_backends(
        config: AppConfig,
        store: Arc<dyn NamespaceStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let objects = ObjectStoreAdapter::new(objects, &config.storage);
        let engine = Arc::new(LiveQueryEngine::new(store.clone(), &config.realtime));
        let observer: Arc<dyn NamespaceObserver> =
            Arc::new(EventBridge::new().with(engine.clone()));

        let files = FileService::new(
            store.clone(),
            objects.clone(),
            observer.clone(),
            config.namespace.clone(),
        );
        let uploads = UploadService::new(
            store.clone(),
            objects.clone(),
            files.clone(),
            config.storage.clone(),
        );
        let folders = FolderService::new(store.clone(), files.clone(), config.namespace.clone());
        let reconciler = Reconciler::new(store.clone(), objects.clone(), observer, &config.worker);

        info!(
            store = store.store_type(),
            objects = objects.store().provider_type(),
            "Application state initialized"
        );

        Self {
            config: Arc::new(config),
            store,
            objects,
            engine,
            folders: Arc::new(folders),
            files: Arc::new(files),
            uploads: Arc::new(uploads),
            reconciler: Arc::new(reconciler),
        }
    }
}
