//! The namespace store abstraction.

use async_trait::async_trait;

use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId, OwnerId, Scope};
use nestdrive_entity::{File, Folder, Listing};

/// Owner-scoped metadata store for folder and file records.
///
/// Folders and files share one id space: inserting a record whose id is
/// already taken by either kind fails with a `Conflict` error. Every read is
/// filtered by owner, so a record belonging to someone else is reported as
/// absent. Records read back are validated before being returned.
#[async_trait]
pub trait NamespaceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the implementation name (e.g., "memory", "sqlite").
    fn store_type(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Insert a new folder record.
    async fn insert_folder(&self, folder: &Folder) -> AppResult<()>;

    /// Insert a new file record.
    async fn insert_file(&self, file: &File) -> AppResult<()>;

    /// Look up a folder by id.
    async fn find_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>>;

    /// Look up a file by id.
    async fn find_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>>;

    /// Folders whose parent equals `parent` (`None` for the owner's root).
    async fn list_folders(
        &self,
        owner: &OwnerId,
        parent: Option<&FolderId>,
    ) -> AppResult<Vec<Folder>>;

    /// Files whose folder equals `folder` (`None` for the owner's root).
    async fn list_files(&self, owner: &OwnerId, folder: Option<&FolderId>)
    -> AppResult<Vec<File>>;

    /// Every folder of an owner.
    async fn list_all_folders(&self, owner: &OwnerId) -> AppResult<Vec<Folder>>;

    /// Every file of an owner.
    async fn list_all_files(&self, owner: &OwnerId) -> AppResult<Vec<File>>;

    /// Every owner holding at least one record.
    async fn list_owners(&self) -> AppResult<Vec<OwnerId>>;

    /// Overwrite the mutable fields of an existing folder.
    ///
    /// Returns `NotFound` when the folder does not exist for its owner.
    async fn update_folder(&self, folder: &Folder) -> AppResult<()>;

    /// Overwrite the mutable fields of an existing file.
    async fn update_file(&self, file: &File) -> AppResult<()>;

    /// Remove a folder record. Returns whether a record was removed.
    async fn delete_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool>;

    /// Remove a file record. Returns whether a record was removed.
    async fn delete_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool>;

    /// The direct children of a scope, in listing order.
    async fn list_scope(&self, scope: &Scope) -> AppResult<Listing> {
        let parent = scope.parent_id.as_ref();
        let mut listing = Listing {
            folders: self.list_folders(&scope.owner_id, parent).await?,
            files: self.list_files(&scope.owner_id, parent).await?,
        };
        listing.sort();
        Ok(listing)
    }
}
