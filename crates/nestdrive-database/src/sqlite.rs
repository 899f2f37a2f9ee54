//! SQLite-backed namespace store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId, OwnerId};
use nestdrive_entity::{File, Folder};

use crate::connection::DatabasePool;
use crate::repositories::{FileRepository, FolderRepository};
use crate::store::NamespaceStore;

/// Namespace store persisting records in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteNamespaceStore {
    pool: DatabasePool,
    folders: FolderRepository,
    files: FileRepository,
}

impl SqliteNamespaceStore {
    /// Create a store over a migrated pool.
    pub fn new(pool: DatabasePool) -> Self {
        let folders = FolderRepository::new(pool.pool().clone());
        let files = FileRepository::new(pool.pool().clone());
        Self {
            pool,
            folders,
            files,
        }
    }
}

#[async_trait]
impl NamespaceStore for SqliteNamespaceStore {
    fn store_type(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.pool.health_check().await
    }

    async fn insert_folder(&self, folder: &Folder) -> AppResult<()> {
        folder.validate()?;
        if !self.folders.create(folder).await? {
            return Err(AppError::conflict(format!(
                "Id {} is already in use",
                folder.id
            )));
        }
        debug!(folder_id = %folder.id, owner_id = %folder.owner_id, "Inserted folder");
        Ok(())
    }

    async fn insert_file(&self, file: &File) -> AppResult<()> {
        file.validate()?;
        if !self.files.create(file).await? {
            return Err(AppError::conflict(format!("Id {} is already in use", file.id)));
        }
        debug!(file_id = %file.id, owner_id = %file.owner_id, "Inserted file");
        Ok(())
    }

    async fn find_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>> {
        self.folders.find_by_id(owner, id).await
    }

    async fn find_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>> {
        self.files.find_by_id(owner, id).await
    }

    async fn list_folders(
        &self,
        owner: &OwnerId,
        parent: Option<&FolderId>,
    ) -> AppResult<Vec<Folder>> {
        self.folders.find_children(owner, parent).await
    }

    async fn list_files(
        &self,
        owner: &OwnerId,
        folder: Option<&FolderId>,
    ) -> AppResult<Vec<File>> {
        self.files.find_by_folder(owner, folder).await
    }

    async fn list_all_folders(&self, owner: &OwnerId) -> AppResult<Vec<Folder>> {
        self.folders.find_by_owner(owner).await
    }

    async fn list_all_files(&self, owner: &OwnerId) -> AppResult<Vec<File>> {
        self.files.find_by_owner(owner).await
    }

    async fn list_owners(&self) -> AppResult<Vec<OwnerId>> {
        let mut raw: BTreeSet<String> = self.folders.find_owners().await?.into_iter().collect();
        raw.extend(self.files.find_owners().await?);
        raw.into_iter().map(OwnerId::parse).collect()
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<()> {
        folder.validate()?;
        if self.folders.update(folder).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Folder {} not found", folder.id)))
        }
    }

    async fn update_file(&self, file: &File) -> AppResult<()> {
        file.validate()?;
        if self.files.update(file).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("File {} not found", file.id)))
        }
    }

    async fn delete_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool> {
        self.folders.delete(owner, id).await
    }

    async fn delete_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool> {
        self.files.delete(owner, id).await
    }
}

#[cfg(test)]
mod tests {
    use nestdrive_core::ErrorKind;
    use nestdrive_core::config::DatabaseConfig;
    use nestdrive_core::types::Scope;
    use nestdrive_entity::Locator;

    use super::*;
    use crate::migration::run_migrations;

    async fn store() -> SqliteNamespaceStore {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let pool = DatabasePool::connect(&config).await.expect("connect");
        run_migrations(pool.pool()).await.expect("migrate");
        SqliteNamespaceStore::new(pool)
    }

    fn owner(s: &str) -> OwnerId {
        OwnerId::parse(s).expect("owner")
    }

    #[tokio::test]
    async fn test_folder_roundtrip_and_scope_listing() {
        let store = store().await;
        let u1 = owner("u1");
        let root = Folder::new(FolderId::generate(), u1.clone(), None, "Docs").expect("folder");
        let child = Folder::new(FolderId::generate(), u1.clone(), Some(root.id.clone()), "2024")
            .expect("folder");
        store.insert_folder(&root).await.expect("insert");
        store.insert_folder(&child).await.expect("insert");

        let found = store.find_folder(&u1, &root.id).await.expect("find");
        assert_eq!(found.map(|f| f.name), Some("Docs".to_string()));

        let top = store.list_scope(&Scope::root(u1.clone())).await.expect("list");
        assert_eq!(top.folders.len(), 1);
        let nested = store
            .list_scope(&Scope::new(u1, Some(root.id.clone())))
            .await
            .expect("list");
        assert_eq!(nested.folders[0].id, child.id);
    }

    #[tokio::test]
    async fn test_file_roundtrip_and_owner_isolation() {
        let store = store().await;
        let u1 = owner("u1");
        let file = File::new(
            FileId::generate(),
            u1.clone(),
            None,
            "a.txt",
            Locator::new("u1/root/x/a.txt", "http://localhost/u1/root/x/a.txt"),
            5,
        )
        .expect("file")
        .with_mime_type(Some("text/plain".into()));
        store.insert_file(&file).await.expect("insert");

        let found = store.find_file(&u1, &file.id).await.expect("find").expect("some");
        assert_eq!(found.locator, file.locator);
        assert_eq!(found.size_bytes, 5);
        assert_eq!(found.mime_type.as_deref(), Some("text/plain"));

        assert!(store.find_file(&owner("u2"), &file.id).await.expect("find").is_none());
        assert_eq!(store.list_owners().await.expect("owners"), vec![u1]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_conflict_across_tables() {
        let store = store().await;
        let u1 = owner("u1");
        let folder = Folder::new(FolderId::generate(), u1.clone(), None, "A").expect("folder");
        store.insert_folder(&folder).await.expect("insert");

        let err = store.insert_folder(&folder).await.expect_err("same table");
        assert_eq!(err.kind, ErrorKind::Conflict);

        let file_id: FileId = folder.id.as_str().parse().expect("file id");
        let file = File::new(file_id, u1, None, "b", Locator::new("p", "u"), 0).expect("file");
        let err = store.insert_file(&file).await.expect_err("other table");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_rows_with_unknown_schema_version_are_rejected() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO folders (id, owner_id, parent_id, name, schema_version, created_at, updated_at) \
             VALUES ('aaaaaaaaaaaaaaaa', 'u1', NULL, 'Old', 99, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(store.pool.pool())
        .await
        .expect("raw insert");

        let err = store
            .list_folders(&owner("u1"), None)
            .await
            .expect_err("bad version");
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let store = store().await;
        let u1 = owner("u1");
        let mut folder = Folder::new(FolderId::generate(), u1.clone(), None, "A").expect("folder");
        store.insert_folder(&folder).await.expect("insert");

        folder.rename("B").expect("rename");
        store.update_folder(&folder).await.expect("update");
        let found = store.find_folder(&u1, &folder.id).await.expect("find").expect("some");
        assert_eq!(found.name, "B");

        assert!(store.delete_folder(&u1, &folder.id).await.expect("delete"));
        assert!(!store.delete_folder(&u1, &folder.id).await.expect("delete again"));
    }
}
