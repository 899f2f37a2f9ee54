//! File record operations.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nestdrive_core::config::NamespaceConfig;
use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::events::{NamespaceEvent, NamespaceEventKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::NamespaceObserver;
use nestdrive_core::types::{FileId, FolderId};
use nestdrive_database::NamespaceStore;
use nestdrive_entity::{File, Locator};
use nestdrive_storage::ObjectStoreAdapter;

use crate::context::SessionContext;

/// Manages file records and their stored objects.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Namespace store.
    store: Arc<dyn NamespaceStore>,
    /// Object store adapter.
    objects: ObjectStoreAdapter,
    /// Receives committed mutations.
    observer: Arc<dyn NamespaceObserver>,
    /// Namespace rules.
    config: NamespaceConfig,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        store: Arc<dyn NamespaceStore>,
        objects: ObjectStoreAdapter,
        observer: Arc<dyn NamespaceObserver>,
        config: NamespaceConfig,
    ) -> Self {
        Self {
            store,
            objects,
            observer,
            config,
        }
    }

    /// Gets a file by ID.
    pub async fn get_file(&self, ctx: &SessionContext, file_id: &FileId) -> AppResult<File> {
        self.store
            .find_file(&ctx.owner_id, file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Record a file whose object has already been written.
    ///
    /// The folder must belong to the caller, and so must the object: its
    /// path has to sit under the caller's owner prefix.
    pub async fn create_file(
        &self,
        ctx: &SessionContext,
        folder_id: Option<FolderId>,
        name: &str,
        locator: Locator,
        size_bytes: u64,
        mime_type: Option<String>,
    ) -> AppResult<File> {
        if let Some(folder_id) = &folder_id {
            if self.store.find_folder(&ctx.owner_id, folder_id).await?.is_none() {
                return Err(AppError::not_found(format!("Folder {folder_id} not found")));
            }
        }
        self.create_file_with_id(
            ctx,
            FileId::generate(),
            folder_id,
            name,
            locator,
            size_bytes,
            mime_type,
        )
        .await
    }

    /// Record a file, trying `first_id` before falling back to fresh ids
    /// when the id is already taken.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn create_file_with_id(
        &self,
        ctx: &SessionContext,
        first_id: FileId,
        folder_id: Option<FolderId>,
        name: &str,
        locator: Locator,
        size_bytes: u64,
        mime_type: Option<String>,
    ) -> AppResult<File> {
        check_locator_owner(ctx, &locator)?;
        let mut id = first_id;
        for attempt in 1..=self.config.id_generation_attempts {
            let file = File::new(
                id,
                ctx.owner_id.clone(),
                folder_id.clone(),
                name,
                locator.clone(),
                size_bytes,
            )?
            .with_mime_type(mime_type.clone());

            match self.store.insert_file(&file).await {
                Ok(()) => {
                    info!(
                        owner_id = %ctx.owner_id,
                        file_id = %file.id,
                        size_bytes,
                        "File created"
                    );
                    self.emit(
                        ctx,
                        NamespaceEventKind::FileCreated {
                            file_id: file.id.clone(),
                            folder_id: file.folder_id.clone(),
                            name: file.name.clone(),
                            size_bytes,
                        },
                    )
                    .await;
                    return Ok(file);
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    warn!(owner_id = %ctx.owner_id, attempt, "File id collision; regenerating");
                    id = FileId::generate();
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict("Could not allocate a unique file id"))
    }

    /// Renames a file. The stored object keeps its path.
    pub async fn rename_file(
        &self,
        ctx: &SessionContext,
        file_id: &FileId,
        new_name: &str,
    ) -> AppResult<File> {
        let mut file = self.get_file(ctx, file_id).await?;
        file.rename(new_name)?;
        self.store.update_file(&file).await?;

        info!(owner_id = %ctx.owner_id, file_id = %file.id, "File renamed");
        self.emit(
            ctx,
            NamespaceEventKind::FileRenamed {
                file_id: file.id.clone(),
                folder_id: file.folder_id.clone(),
                name: file.name.clone(),
            },
        )
        .await;
        Ok(file)
    }

    /// Deletes a file: the object first, then the record.
    ///
    /// Deleting a file that no longer exists succeeds.
    pub async fn delete_file(
        &self,
        ctx: &SessionContext,
        file_id: &FileId,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        if cancel.is_cancelled() {
            return Err(AppError::cancelled("Delete was cancelled"));
        }
        match self.store.find_file(&ctx.owner_id, file_id).await? {
            Some(file) => self.remove(ctx, &file).await,
            None => Ok(()),
        }
    }

    /// Remove an already loaded file record and its object.
    pub(crate) async fn remove(&self, ctx: &SessionContext, file: &File) -> AppResult<()> {
        self.objects.delete(&file.locator.path).await?;

        if let Err(e) = self.store.delete_file(&ctx.owner_id, &file.id).await {
            error!(
                owner_id = %ctx.owner_id,
                file_id = %file.id,
                path = %file.locator.path,
                error = %e,
                "Object deleted but file record remains"
            );
            return Err(AppError::with_source(
                ErrorKind::PartialFailure,
                format!("File {} lost its object but its record could not be removed", file.id),
                e,
            ));
        }

        info!(owner_id = %ctx.owner_id, file_id = %file.id, "File deleted");
        self.emit(
            ctx,
            NamespaceEventKind::FileDeleted {
                file_id: file.id.clone(),
                folder_id: file.folder_id.clone(),
            },
        )
        .await;
        Ok(())
    }

    /// Reads a file's content.
    pub async fn download(&self, ctx: &SessionContext, file_id: &FileId) -> AppResult<(File, Bytes)> {
        let file = self.get_file(ctx, file_id).await?;
        let data = self.objects.get(&file.locator).await?;
        Ok((file, data))
    }

    /// Retrieval URL for a file ("copy link").
    pub async fn resolve_url(&self, ctx: &SessionContext, file_id: &FileId) -> AppResult<String> {
        let file = self.get_file(ctx, file_id).await?;
        self.objects.resolve_url(&file.locator).await
    }

    pub(crate) async fn emit(&self, ctx: &SessionContext, kind: NamespaceEventKind) {
        self.observer
            .on_event(&NamespaceEvent::new(ctx.owner_id.clone(), kind))
            .await;
    }
}

/// Reject a locator whose object lives outside the caller's namespace.
fn check_locator_owner(ctx: &SessionContext, locator: &Locator) -> AppResult<()> {
    let owned = locator
        .path
        .strip_prefix(ctx.owner_id.as_str())
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1);
    if owned {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Object path '{}' is outside this account's storage",
            locator.path
        )))
    }
}
