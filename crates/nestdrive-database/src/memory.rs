//! In-process namespace store.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId, OwnerId};
use nestdrive_entity::{File, Folder};

use crate::store::NamespaceStore;

#[derive(Debug, Default)]
struct Tables {
    folders: HashMap<FolderId, Folder>,
    files: HashMap<FileId, File>,
    /// Every id in use, folders and files alike.
    ids: HashSet<String>,
}

impl Tables {
    fn id_taken(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// Namespace store keeping every record in memory.
///
/// Used for tests and for the `"memory"` database URL.
#[derive(Debug, Default)]
pub struct MemoryNamespaceStore {
    tables: RwLock<Tables>,
}

impl MemoryNamespaceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NamespaceStore for MemoryNamespaceStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn insert_folder(&self, folder: &Folder) -> AppResult<()> {
        folder.validate()?;
        let mut tables = self.tables.write().await;
        if tables.id_taken(folder.id.as_str()) {
            return Err(AppError::conflict(format!(
                "Id {} is already in use",
                folder.id
            )));
        }
        tables.ids.insert(folder.id.to_string());
        tables.folders.insert(folder.id.clone(), folder.clone());
        debug!(folder_id = %folder.id, owner_id = %folder.owner_id, "Inserted folder");
        Ok(())
    }

    async fn insert_file(&self, file: &File) -> AppResult<()> {
        file.validate()?;
        let mut tables = self.tables.write().await;
        if tables.id_taken(file.id.as_str()) {
            return Err(AppError::conflict(format!("Id {} is already in use", file.id)));
        }
        tables.ids.insert(file.id.to_string());
        tables.files.insert(file.id.clone(), file.clone());
        debug!(file_id = %file.id, owner_id = %file.owner_id, "Inserted file");
        Ok(())
    }

    async fn find_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .get(id)
            .filter(|f| &f.owner_id == owner)
            .cloned())
    }

    async fn find_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .get(id)
            .filter(|f| &f.owner_id == owner)
            .cloned())
    }

    async fn list_folders(
        &self,
        owner: &OwnerId,
        parent: Option<&FolderId>,
    ) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let mut folders: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| &f.owner_id == owner && f.parent_id.as_ref() == parent)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn list_files(
        &self,
        owner: &OwnerId,
        folder: Option<&FolderId>,
    ) -> AppResult<Vec<File>> {
        let tables = self.tables.read().await;
        let mut files: Vec<File> = tables
            .files
            .values()
            .filter(|f| &f.owner_id == owner && f.folder_id.as_ref() == folder)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    async fn list_all_folders(&self, owner: &OwnerId) -> AppResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .values()
            .filter(|f| &f.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list_all_files(&self, owner: &OwnerId) -> AppResult<Vec<File>> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .filter(|f| &f.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list_owners(&self) -> AppResult<Vec<OwnerId>> {
        let tables = self.tables.read().await;
        let owners: BTreeSet<OwnerId> = tables
            .folders
            .values()
            .map(|f| f.owner_id.clone())
            .chain(tables.files.values().map(|f| f.owner_id.clone()))
            .collect();
        Ok(owners.into_iter().collect())
    }

    async fn update_folder(&self, folder: &Folder) -> AppResult<()> {
        folder.validate()?;
        let mut tables = self.tables.write().await;
        match tables.folders.get_mut(&folder.id) {
            Some(existing) if existing.owner_id == folder.owner_id => {
                existing.name = folder.name.clone();
                existing.parent_id = folder.parent_id.clone();
                existing.updated_at = folder.updated_at;
                Ok(())
            }
            _ => Err(AppError::not_found(format!("Folder {} not found", folder.id))),
        }
    }

    async fn update_file(&self, file: &File) -> AppResult<()> {
        file.validate()?;
        let mut tables = self.tables.write().await;
        match tables.files.get_mut(&file.id) {
            Some(existing) if existing.owner_id == file.owner_id => {
                existing.name = file.name.clone();
                existing.folder_id = file.folder_id.clone();
                existing.updated_at = file.updated_at;
                Ok(())
            }
            _ => Err(AppError::not_found(format!("File {} not found", file.id))),
        }
    }

    async fn delete_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .folders
            .get(id)
            .is_some_and(|f| &f.owner_id == owner);
        if owned {
            tables.folders.remove(id);
            tables.ids.remove(id.as_str());
        }
        Ok(owned)
    }

    async fn delete_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables.files.get(id).is_some_and(|f| &f.owner_id == owner);
        if owned {
            tables.files.remove(id);
            tables.ids.remove(id.as_str());
        }
        Ok(owned)
    }
}
