//! A live, optimistically updated view of one folder.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId, Scope};
use nestdrive_entity::{File, Folder, Listing, Locator};
use nestdrive_storage::ProgressCallback;

use super::cache::{OpId, PendingChange, ViewCache};
use crate::context::SessionContext;
use crate::state::AppState;

/// What a user sees of one folder.
///
/// Opening the view subscribes to the folder's scope; a background task
/// applies every snapshot to a [`ViewCache`]. Mutations made through the
/// view show up immediately and are rolled back, with an inline error,
/// when the service rejects them.
#[derive(Debug)]
pub struct FolderView {
    state: AppState,
    ctx: SessionContext,
    scope: Scope,
    cache: Arc<Mutex<ViewCache>>,
    revision: Arc<watch::Sender<u64>>,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

impl FolderView {
    /// Open a view of `parent_id` (`None` for the root).
    ///
    /// Returns once the initial snapshot has been applied.
    pub async fn open(
        state: AppState,
        ctx: SessionContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<Self> {
        let mut subscription = state.engine.subscribe(&ctx.owner_id, parent_id).await?;
        let scope = subscription.scope().clone();

        let mut cache = ViewCache::new(scope.clone());
        if let Some(initial) = subscription.next().await {
            cache.apply_snapshot(initial);
        }
        let cache = Arc::new(Mutex::new(cache));
        let (revision, _) = watch::channel(0u64);
        let revision = Arc::new(revision);
        let cancel = CancellationToken::new();

        let pump = {
            let cache = cache.clone();
            let revision = revision.clone();
            let cancel = cancel.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                loop {
                    let snapshot = tokio::select! {
                        _ = cancel.cancelled() => break,
                        next = subscription.next() => next,
                    };
                    let Some(snapshot) = snapshot else {
                        debug!(scope = %scope, "Live query ended");
                        break;
                    };
                    if lock(&cache).apply_snapshot(snapshot) {
                        revision.send_modify(|r| *r += 1);
                    }
                }
                subscription.cancel();
            })
        };

        Ok(Self {
            state,
            ctx,
            scope,
            cache,
            revision,
            cancel,
            pump,
        })
    }

    /// The scope shown.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Current listing including pending changes.
    pub fn listing(&self) -> Listing {
        lock(&self.cache).listing()
    }

    /// Inline error left by the last failed change.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.cache).last_error().map(str::to_string)
    }

    /// Whether snapshots are still arriving.
    pub fn is_live(&self) -> bool {
        !self.pump.is_finished()
    }

    /// Receiver that changes whenever the listing may have changed.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Wait until the listing satisfies `predicate`. Does not return while
    /// it never does; callers bound it with a timeout.
    pub async fn wait_until<F>(&self, predicate: F) -> Listing
    where
        F: Fn(&Listing) -> bool,
    {
        let mut updates = self.updates();
        loop {
            let listing = self.listing();
            if predicate(&listing) || updates.changed().await.is_err() {
                return listing;
            }
        }
    }

    /// Create a folder here.
    pub async fn create_folder(&self, name: &str) -> AppResult<Folder> {
        let placeholder = Folder::new(
            FolderId::generate(),
            self.ctx.owner_id.clone(),
            self.scope.parent_id.clone(),
            name,
        );
        let placeholder = match placeholder {
            Ok(folder) => folder,
            Err(e) => return Err(self.refuse(e)),
        };

        let id = placeholder.id.clone();
        let op = self.begin(PendingChange::AddFolder(placeholder));
        let result = self
            .state
            .folders
            .create_folder_with_id(&self.ctx, id, self.scope.parent_id.clone(), name)
            .await;
        self.settle(op, &result, |folder| {
            Some(PendingChange::AddFolder(folder.clone()))
        });
        result
    }

    /// Upload a file here.
    pub async fn upload(
        &self,
        name: &str,
        data: Bytes,
        progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> AppResult<File> {
        let placeholder = File::new(
            FileId::generate(),
            self.ctx.owner_id.clone(),
            self.scope.parent_id.clone(),
            name,
            Locator::new("", ""),
            data.len() as u64,
        );
        let placeholder = match placeholder {
            Ok(file) => file,
            Err(e) => return Err(self.refuse(e)),
        };

        let id = placeholder.id.clone();
        let op = self.begin(PendingChange::AddFile(placeholder));
        let result = self
            .state
            .uploads
            .upload_with_id(
                &self.ctx,
                id,
                self.scope.parent_id.clone(),
                name,
                data,
                progress,
                cancel,
            )
            .await;
        self.settle(op, &result, |file| Some(PendingChange::AddFile(file.clone())));
        result
    }

    /// Delete a child folder and everything below it.
    pub async fn delete_folder(
        &self,
        folder_id: &FolderId,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let op = self.begin(PendingChange::RemoveFolder(folder_id.clone()));
        let result = self
            .state
            .folders
            .delete_folder(&self.ctx, folder_id, cancel)
            .await;
        self.settle(op, &result, |_| None);
        result
    }

    /// Delete a file in this folder.
    pub async fn delete_file(&self, file_id: &FileId, cancel: &CancellationToken) -> AppResult<()> {
        let op = self.begin(PendingChange::RemoveFile(file_id.clone()));
        let result = self.state.files.delete_file(&self.ctx, file_id, cancel).await;
        self.settle(op, &result, |_| None);
        result
    }

    /// Rename a child folder.
    pub async fn rename_folder(&self, folder_id: &FolderId, name: &str) -> AppResult<Folder> {
        let op = self.begin(PendingChange::RenameFolder {
            id: folder_id.clone(),
            name: name.to_string(),
        });
        let result = self
            .state
            .folders
            .rename_folder(&self.ctx, folder_id, name)
            .await;
        self.settle(op, &result, |_| None);
        result
    }

    /// Rename a file in this folder.
    pub async fn rename_file(&self, file_id: &FileId, name: &str) -> AppResult<File> {
        let op = self.begin(PendingChange::RenameFile {
            id: file_id.clone(),
            name: name.to_string(),
        });
        let result = self.state.files.rename_file(&self.ctx, file_id, name).await;
        self.settle(op, &result, |_| None);
        result
    }

    /// Stop following the folder.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn begin(&self, change: PendingChange) -> OpId {
        let op = lock(&self.cache).begin(change);
        self.bump();
        op
    }

    /// Confirm or roll back a change once the service answered.
    fn settle<T>(
        &self,
        op: OpId,
        result: &AppResult<T>,
        committed: impl FnOnce(&T) -> Option<PendingChange>,
    ) {
        {
            let mut cache = lock(&self.cache);
            match result {
                Ok(value) => match committed(value) {
                    Some(change) => cache.confirm_with(op, change),
                    None => cache.confirm(op),
                },
                Err(e) => {
                    warn!(owner_id = %self.ctx.owner_id, scope = %self.scope, error = %e, "Change rolled back");
                    cache.rollback(op, e.user_message());
                }
            }
        }
        self.bump();
    }

    fn refuse(&self, error: AppError) -> AppError {
        lock(&self.cache).record_error(error.user_message());
        self.bump();
        error
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl Drop for FolderView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn lock(cache: &Mutex<ViewCache>) -> MutexGuard<'_, ViewCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}
