//! Uploads: object write first, then the metadata record.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nestdrive_core::config::StorageConfig;
use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId};
use nestdrive_database::NamespaceStore;
use nestdrive_entity::File;
use nestdrive_entity::name::validate_name;
use nestdrive_storage::mime::guess_mime_type;
use nestdrive_storage::{ObjectStoreAdapter, ProgressCallback, UploadProgress};

use super::service::FileService;
use crate::context::SessionContext;

/// One file of a batch upload.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// File name.
    pub name: String,
    /// File content.
    pub data: Bytes,
}

/// Result of one batch item.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Name of the item.
    pub name: String,
    /// The created file, or why it failed.
    pub result: AppResult<File>,
}

/// Progress callback for batch uploads, keyed by item name.
pub type BatchProgressCallback = Arc<dyn Fn(&str, UploadProgress) + Send + Sync>;

/// Coordinates payload writes with file record creation.
///
/// The object store and the namespace store are never updated atomically.
/// When the record cannot be written after the object was, the object is
/// deleted again; if that also fails the caller gets a `PartialFailure` and
/// the orphan is left for the reconciler.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: Arc<dyn NamespaceStore>,
    objects: ObjectStoreAdapter,
    files: FileService,
    config: StorageConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        store: Arc<dyn NamespaceStore>,
        objects: ObjectStoreAdapter,
        files: FileService,
        config: StorageConfig,
    ) -> Self {
        Self {
            store,
            objects,
            files,
            config,
        }
    }

    /// Upload one file into `folder_id` (`None` for the root).
    pub async fn upload(
        &self,
        ctx: &SessionContext,
        folder_id: Option<FolderId>,
        name: &str,
        data: Bytes,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> AppResult<File> {
        self.upload_with_id(ctx, FileId::generate(), folder_id, name, data, progress, cancel)
            .await
    }

    /// Upload one file, recording it under `file_id` unless that id is
    /// already taken.
    #[allow(clippy::too_many_arguments)]
    pub async fn upload_with_id(
        &self,
        ctx: &SessionContext,
        file_id: FileId,
        folder_id: Option<FolderId>,
        name: &str,
        data: Bytes,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> AppResult<File> {
        validate_name(name)?;
        let size_bytes = data.len() as u64;
        if size_bytes > self.config.max_upload_size_bytes {
            return Err(AppError::limit_exceeded(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        if let Some(folder_id) = &folder_id {
            if self.store.find_folder(&ctx.owner_id, folder_id).await?.is_none() {
                return Err(AppError::not_found(format!("Folder {folder_id} not found")));
            }
        }

        let path =
            ObjectStoreAdapter::object_path(&ctx.owner_id, folder_id.as_ref(), &file_id, name);
        let locator = self.objects.put(&path, data, progress, cancel).await?;

        if cancel.is_cancelled() {
            self.compensate(ctx, &path).await?;
            return Err(AppError::cancelled(format!("Upload of {name} was cancelled")));
        }

        let created = self
            .files
            .create_file_with_id(
                ctx,
                file_id,
                folder_id,
                name,
                locator,
                size_bytes,
                guess_mime_type(name),
            )
            .await;

        match created {
            Ok(file) => {
                info!(owner_id = %ctx.owner_id, file_id = %file.id, name, "Upload complete");
                Ok(file)
            }
            Err(e) => {
                warn!(owner_id = %ctx.owner_id, path = %path, error = %e, "File record failed; removing object");
                self.compensate(ctx, &path).await?;
                Err(e)
            }
        }
    }

    /// Delete an object whose record will not be written.
    async fn compensate(&self, ctx: &SessionContext, path: &str) -> AppResult<()> {
        self.objects.delete(path).await.map_err(|e| {
            error!(owner_id = %ctx.owner_id, path, error = %e, "Orphaned object could not be removed");
            AppError::with_source(
                ErrorKind::PartialFailure,
                format!("Object {path} was stored without a record and could not be removed"),
                e,
            )
        })
    }

    /// Upload several files concurrently, at most `max_concurrent_uploads`
    /// at a time. Outcomes are returned in completion order.
    pub async fn upload_batch(
        &self,
        ctx: &SessionContext,
        folder_id: Option<FolderId>,
        items: Vec<BatchItem>,
        progress: Option<BatchProgressCallback>,
        cancel: &CancellationToken,
    ) -> Vec<BatchOutcome> {
        let total = items.len();
        let outcomes: Vec<BatchOutcome> = stream::iter(items)
            .map(|item| {
                let folder_id = folder_id.clone();
                let item_progress = progress.clone().map(|callback| {
                    let name = item.name.clone();
                    Arc::new(move |p: UploadProgress| callback(&name, p)) as ProgressCallback
                });
                async move {
                    let result = self
                        .upload(ctx, folder_id, &item.name, item.data, item_progress, cancel)
                        .await;
                    BatchOutcome {
                        name: item.name,
                        result,
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_uploads.max(1))
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(owner_id = %ctx.owner_id, total, failed, "Batch upload finished");
        outcomes
    }
}
