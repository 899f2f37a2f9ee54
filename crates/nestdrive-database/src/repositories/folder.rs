//! Folder repository implementation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FolderId, OwnerId};
use nestdrive_entity::Folder;

use super::{map_insert_error, schema_version};

const COLUMNS: &str = "id, owner_id, parent_id, name, schema_version, created_at, updated_at";

/// Raw `folders` row, validated before it becomes a [`Folder`].
#[derive(Debug, sqlx::FromRow)]
struct FolderRow {
    id: String,
    owner_id: String,
    parent_id: Option<String>,
    name: String,
    schema_version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FolderRow> for Folder {
    type Error = AppError;

    fn try_from(row: FolderRow) -> Result<Self, Self::Error> {
        let folder = Folder {
            schema_version: schema_version(row.schema_version, &row.id)?,
            id: FolderId::try_from(row.id)?,
            name: row.name,
            owner_id: OwnerId::parse(row.owner_id)?,
            parent_id: row.parent_id.map(FolderId::try_from).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        folder.validate()?;
        Ok(folder)
    }
}

fn into_folders(rows: Vec<FolderRow>) -> AppResult<Vec<Folder>> {
    rows.into_iter().map(Folder::try_from).collect()
}

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID within an owner's namespace.
    pub async fn find_by_id(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>> {
        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {COLUMNS} FROM folders WHERE owner_id = ? AND id = ?"
        ))
        .bind(owner.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))?;
        row.map(Folder::try_from).transpose()
    }

    /// List direct children of a parent (`None` for the owner's root).
    pub async fn find_children(
        &self,
        owner: &OwnerId,
        parent: Option<&FolderId>,
    ) -> AppResult<Vec<Folder>> {
        let rows = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {COLUMNS} FROM folders WHERE owner_id = ? AND parent_id IS ? \
             ORDER BY name ASC, created_at ASC, id ASC"
        ))
        .bind(owner.as_str())
        .bind(parent.map(FolderId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))?;
        into_folders(rows)
    }

    /// List every folder of an owner.
    pub async fn find_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<Folder>> {
        let rows = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {COLUMNS} FROM folders WHERE owner_id = ?"
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list owner folders", e)
        })?;
        into_folders(rows)
    }

    /// Distinct owners with at least one folder.
    pub async fn find_owners(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT owner_id FROM folders")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list owners", e))
    }

    /// Insert a folder unless its id is already used by a file.
    ///
    /// Returns `false` when the id clashes with a file.
    pub async fn create(&self, folder: &Folder) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO folders (id, owner_id, parent_id, name, schema_version, created_at, updated_at) \
             SELECT ?, ?, ?, ?, ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM files WHERE id = ?)",
        )
        .bind(folder.id.as_str())
        .bind(folder.owner_id.as_str())
        .bind(folder.parent_id.as_ref().map(FolderId::as_str))
        .bind(&folder.name)
        .bind(i64::from(folder.schema_version))
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .bind(folder.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Folder"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Update name, parent and timestamp. Returns whether a row matched.
    pub async fn update(&self, folder: &Folder) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET name = ?, parent_id = ?, updated_at = ? \
             WHERE owner_id = ? AND id = ?",
        )
        .bind(&folder.name)
        .bind(folder.parent_id.as_ref().map(FolderId::as_str))
        .bind(folder.updated_at)
        .bind(folder.owner_id.as_str())
        .bind(folder.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a folder row.
    pub async fn delete(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE owner_id = ? AND id = ?")
            .bind(owner.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
