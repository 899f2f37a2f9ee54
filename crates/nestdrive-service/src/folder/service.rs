//! Folder CRUD, moves, and deletion policy.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use nestdrive_core::config::{DeletePolicy, NamespaceConfig};
use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::events::NamespaceEventKind;
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FolderId, Scope};
use nestdrive_database::NamespaceStore;
use nestdrive_entity::name::validate_name;
use nestdrive_entity::{File, Folder, FolderTree, Listing};

use super::tree::build_tree;
use crate::context::SessionContext;
use crate::file::FileService;

/// Manages folder CRUD operations.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Namespace store.
    store: Arc<dyn NamespaceStore>,
    /// File service, used to remove files during cascading deletes.
    files: FileService,
    /// Namespace rules.
    config: NamespaceConfig,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(store: Arc<dyn NamespaceStore>, files: FileService, config: NamespaceConfig) -> Self {
        Self {
            store,
            files,
            config,
        }
    }

    /// Gets a folder by ID.
    pub async fn get_folder(&self, ctx: &SessionContext, folder_id: &FolderId) -> AppResult<Folder> {
        self.store
            .find_folder(&ctx.owner_id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Lists the direct children of `parent_id` (`None` for the root).
    pub async fn list_children(
        &self,
        ctx: &SessionContext,
        parent_id: Option<&FolderId>,
    ) -> AppResult<Listing> {
        self.store
            .list_scope(&Scope::new(ctx.owner_id.clone(), parent_id.cloned()))
            .await
    }

    /// Creates a new folder.
    pub async fn create_folder(
        &self,
        ctx: &SessionContext,
        parent_id: Option<FolderId>,
        name: &str,
    ) -> AppResult<Folder> {
        self.create_folder_with_id(ctx, FolderId::generate(), parent_id, name)
            .await
    }

    /// Creates a new folder, trying `first_id` before falling back to fresh
    /// ids when the id is already taken.
    pub async fn create_folder_with_id(
        &self,
        ctx: &SessionContext,
        first_id: FolderId,
        parent_id: Option<FolderId>,
        name: &str,
    ) -> AppResult<Folder> {
        validate_name(name)?;
        if let Some(parent_id) = &parent_id {
            self.get_folder(ctx, parent_id).await?;
        }

        let mut id = first_id;
        for attempt in 1..=self.config.id_generation_attempts {
            let folder = Folder::new(
                id.clone(),
                ctx.owner_id.clone(),
                parent_id.clone(),
                name,
            )?;
            match self.store.insert_folder(&folder).await {
                Ok(()) => {
                    info!(
                        owner_id = %ctx.owner_id,
                        folder_id = %folder.id,
                        name = %folder.name,
                        "Folder created"
                    );
                    self.files
                        .emit(
                            ctx,
                            NamespaceEventKind::FolderCreated {
                                folder_id: folder.id.clone(),
                                parent_id: folder.parent_id.clone(),
                                name: folder.name.clone(),
                            },
                        )
                        .await;
                    return Ok(folder);
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    warn!(owner_id = %ctx.owner_id, attempt, "Folder id collision; regenerating");
                    id = FolderId::generate();
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict("Could not allocate a unique folder id"))
    }

    /// Renames a folder.
    pub async fn rename_folder(
        &self,
        ctx: &SessionContext,
        folder_id: &FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        let mut folder = self.get_folder(ctx, folder_id).await?;
        folder.rename(new_name)?;
        self.store.update_folder(&folder).await?;

        info!(owner_id = %ctx.owner_id, folder_id = %folder.id, "Folder renamed");
        self.files
            .emit(
                ctx,
                NamespaceEventKind::FolderRenamed {
                    folder_id: folder.id.clone(),
                    parent_id: folder.parent_id.clone(),
                    name: folder.name.clone(),
                },
            )
            .await;
        Ok(folder)
    }

    /// Moves a folder under a new parent (`None` for the root).
    ///
    /// Rejects moving a folder into itself or one of its descendants.
    pub async fn move_folder(
        &self,
        ctx: &SessionContext,
        folder_id: &FolderId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let mut folder = self.get_folder(ctx, folder_id).await?;
        if folder.parent_id == new_parent_id {
            return Ok(folder);
        }

        if let Some(target) = &new_parent_id {
            let chain = self.ancestors(ctx, target).await?;
            if chain.iter().any(|f| &f.id == folder_id) {
                return Err(AppError::validation(
                    "Cannot move a folder into itself or one of its sub-folders",
                ));
            }
        }

        let from_parent_id = folder.parent_id.clone();
        folder.parent_id = new_parent_id;
        folder.updated_at = chrono::Utc::now();
        self.store.update_folder(&folder).await?;

        info!(owner_id = %ctx.owner_id, folder_id = %folder.id, "Folder moved");
        self.files
            .emit(
                ctx,
                NamespaceEventKind::FolderMoved {
                    folder_id: folder.id.clone(),
                    from_parent_id,
                    to_parent_id: folder.parent_id.clone(),
                },
            )
            .await;
        Ok(folder)
    }

    /// The chain of folders from the root down to `folder_id` inclusive.
    pub async fn ancestors(
        &self,
        ctx: &SessionContext,
        folder_id: &FolderId,
    ) -> AppResult<Vec<Folder>> {
        let mut chain = vec![self.get_folder(ctx, folder_id).await?];
        while let Some(parent_id) = chain.last().and_then(|f| f.parent_id.clone()) {
            if chain.len() > self.config.max_depth {
                return Err(AppError::internal(format!(
                    "Folder {folder_id} is nested deeper than {} levels",
                    self.config.max_depth
                )));
            }
            chain.push(self.get_folder(ctx, &parent_id).await?);
        }
        chain.reverse();
        Ok(chain)
    }

    /// The owner's full folder tree with per-folder file counts.
    pub async fn tree(&self, ctx: &SessionContext) -> AppResult<FolderTree> {
        let folders = self.store.list_all_folders(&ctx.owner_id).await?;
        let files = self.store.list_all_files(&ctx.owner_id).await?;
        Ok(build_tree(folders, &files))
    }

    /// Deletes a folder according to the configured [`DeletePolicy`].
    ///
    /// Deleting a folder that no longer exists succeeds. A cascading
    /// delete removes every descendant file (object, then record), then the
    /// descendant folders deepest-first, then the folder itself.
    pub async fn delete_folder(
        &self,
        ctx: &SessionContext,
        folder_id: &FolderId,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let Some(folder) = self.store.find_folder(&ctx.owner_id, folder_id).await? else {
            return Ok(());
        };

        match self.config.delete_policy {
            DeletePolicy::RejectNonEmpty => {
                if !self.store.list_scope(&folder.child_scope()).await?.is_empty() {
                    return Err(AppError::conflict(format!(
                        "Folder '{}' is not empty",
                        folder.name
                    )));
                }
                self.remove_folder(ctx, &folder).await
            }
            DeletePolicy::Cascade => {
                let (levels, files) = self.collect_subtree(&folder).await?;
                for file in &files {
                    check_cancel(cancel)?;
                    self.files.remove(ctx, file).await?;
                }
                for level in levels.iter().rev() {
                    for descendant in level {
                        check_cancel(cancel)?;
                        self.remove_folder(ctx, descendant).await?;
                    }
                }
                info!(
                    owner_id = %ctx.owner_id,
                    folder_id = %folder.id,
                    files = files.len(),
                    folders = levels.iter().map(Vec::len).sum::<usize>(),
                    "Folder deleted with contents"
                );
                Ok(())
            }
        }
    }

    /// Breadth-first walk returning folders grouped by depth (the root
    /// folder alone at level 0) and every file in the subtree.
    async fn collect_subtree(
        &self,
        root: &Folder,
    ) -> AppResult<(Vec<Vec<Folder>>, Vec<File>)> {
        let mut levels = vec![vec![root.clone()]];
        let mut files = Vec::new();
        loop {
            let mut next = Vec::new();
            for folder in levels.last().map(Vec::as_slice).unwrap_or_default() {
                let listing = self.store.list_scope(&folder.child_scope()).await?;
                files.extend(listing.files);
                next.extend(listing.folders);
            }
            if next.is_empty() {
                break;
            }
            if levels.len() > self.config.max_depth {
                return Err(AppError::internal(format!(
                    "Folder {} is nested deeper than {} levels",
                    root.id, self.config.max_depth
                )));
            }
            levels.push(next);
        }
        Ok((levels, files))
    }

    async fn remove_folder(&self, ctx: &SessionContext, folder: &Folder) -> AppResult<()> {
        if self.store.delete_folder(&ctx.owner_id, &folder.id).await? {
            info!(owner_id = %ctx.owner_id, folder_id = %folder.id, "Folder deleted");
            self.files
                .emit(
                    ctx,
                    NamespaceEventKind::FolderDeleted {
                        folder_id: folder.id.clone(),
                        parent_id: folder.parent_id.clone(),
                    },
                )
                .await;
        }
        Ok(())
    }
}

fn check_cancel(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        Err(AppError::cancelled("Delete was cancelled"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use nestdrive_core::config::AppConfig;
    use nestdrive_core::types::OwnerId;
    use nestdrive_database::MemoryNamespaceStore;
    use nestdrive_storage::MemoryObjectStore;

    use super::*;
    use crate::state::AppState;

    fn state_with(config: AppConfig) -> AppState {
        AppState::with_backends(
            config,
            Arc::new(MemoryNamespaceStore::new()),
            Arc::new(MemoryObjectStore::new()),
        )
    }

    fn ctx(owner: &str) -> SessionContext {
        SessionContext::new(OwnerId::parse(owner).expect("owner"))
    }

    #[tokio::test]
    async fn test_create_and_list_children() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let docs = state.folders.create_folder(&ctx, None, "Docs").await.unwrap();
        state
            .folders
            .create_folder(&ctx, Some(docs.id.clone()), "2024")
            .await
            .unwrap();
        state.folders.create_folder(&ctx, None, "Docs").await.unwrap();

        let root = state.folders.list_children(&ctx, None).await.unwrap();
        assert_eq!(root.folders.len(), 2);
        let inner = state.folders.list_children(&ctx, Some(&docs.id)).await.unwrap();
        assert_eq!(inner.folders[0].name, "2024");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let state = state_with(AppConfig::default());
        let a = ctx("alice");
        let b = ctx("bob");
        let folder = state.folders.create_folder(&a, None, "Private").await.unwrap();

        assert!(state.folders.list_children(&b, None).await.unwrap().is_empty());
        let err = state.folders.get_folder(&b, &folder.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = state
            .folders
            .create_folder(&b, Some(folder.id.clone()), "Intruder")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_move_rejects_cycles() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let a = state.folders.create_folder(&ctx, None, "a").await.unwrap();
        let b = state
            .folders
            .create_folder(&ctx, Some(a.id.clone()), "b")
            .await
            .unwrap();

        let err = state
            .folders
            .move_folder(&ctx, &a.id, Some(b.id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = state
            .folders
            .move_folder(&ctx, &a.id, Some(a.id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let moved = state.folders.move_folder(&ctx, &b.id, None).await.unwrap();
        assert!(moved.is_root());
        assert_eq!(state.folders.list_children(&ctx, None).await.unwrap().folders.len(), 2);
    }

    #[tokio::test]
    async fn test_ancestors_are_root_first() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let a = state.folders.create_folder(&ctx, None, "a").await.unwrap();
        let b = state
            .folders
            .create_folder(&ctx, Some(a.id.clone()), "b")
            .await
            .unwrap();
        let c = state
            .folders
            .create_folder(&ctx, Some(b.id.clone()), "c")
            .await
            .unwrap();

        let names: Vec<_> = state
            .folders
            .ancestors(&ctx, &c.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_subtree_and_objects() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let cancel = CancellationToken::new();
        let top = state.folders.create_folder(&ctx, None, "top").await.unwrap();
        let mid = state
            .folders
            .create_folder(&ctx, Some(top.id.clone()), "mid")
            .await
            .unwrap();
        let file = state
            .uploads
            .upload(&ctx, Some(mid.id.clone()), "deep.txt", Bytes::from_static(b"x"), None, &cancel)
            .await
            .unwrap();

        state.folders.delete_folder(&ctx, &top.id, &cancel).await.unwrap();

        assert!(state.store.list_all_folders(&ctx.owner_id).await.unwrap().is_empty());
        assert!(state.store.list_all_files(&ctx.owner_id).await.unwrap().is_empty());
        assert!(!state.objects.store().exists(&file.locator.path).await.unwrap());

        // Deleting again is a no-op.
        state.folders.delete_folder(&ctx, &top.id, &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_reject_non_empty_policy() {
        let mut config = AppConfig::default();
        config.namespace.delete_policy = DeletePolicy::RejectNonEmpty;
        let state = state_with(config);
        let ctx = ctx("u1");
        let cancel = CancellationToken::new();
        let top = state.folders.create_folder(&ctx, None, "top").await.unwrap();
        let child = state
            .folders
            .create_folder(&ctx, Some(top.id.clone()), "child")
            .await
            .unwrap();

        let err = state.folders.delete_folder(&ctx, &top.id, &cancel).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        state.folders.delete_folder(&ctx, &child.id, &cancel).await.unwrap();
        state.folders.delete_folder(&ctx, &top.id, &cancel).await.unwrap();
        assert!(state.folders.list_children(&ctx, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_delete_stops_early() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let top = state.folders.create_folder(&ctx, None, "top").await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = state.folders.delete_folder(&ctx, &top.id, &cancel).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(state.folders.get_folder(&ctx, &top.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_tree_counts_files() {
        let state = state_with(AppConfig::default());
        let ctx = ctx("u1");
        let cancel = CancellationToken::new();
        let docs = state.folders.create_folder(&ctx, None, "Docs").await.unwrap();
        for name in ["a", "b"] {
            state
                .uploads
                .upload(&ctx, Some(docs.id.clone()), name, Bytes::from_static(b"1"), None, &cancel)
                .await
                .unwrap();
        }

        let tree = state.folders.tree(&ctx).await.unwrap();
        assert_eq!(tree.total_folders, 1);
        assert_eq!(tree.roots[0].file_count, 2);
    }
}
