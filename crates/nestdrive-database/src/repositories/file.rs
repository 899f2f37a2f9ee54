//! File repository implementation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId, OwnerId};
use nestdrive_entity::{File, Locator};

use super::{map_insert_error, schema_version};

const COLUMNS: &str = "id, owner_id, folder_id, name, object_path, url, size_bytes, mime_type, \
                       schema_version, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: String,
    owner_id: String,
    folder_id: Option<String>,
    name: String,
    object_path: String,
    url: String,
    size_bytes: i64,
    mime_type: Option<String>,
    schema_version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for File {
    type Error = AppError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        let size_bytes = u64::try_from(row.size_bytes).map_err(|_| {
            AppError::validation(format!("File {} has negative size", row.id))
        })?;
        let file = File {
            schema_version: schema_version(row.schema_version, &row.id)?,
            id: FileId::try_from(row.id)?,
            name: row.name,
            owner_id: OwnerId::parse(row.owner_id)?,
            folder_id: row.folder_id.map(FolderId::try_from).transpose()?,
            locator: Locator::new(row.object_path, row.url),
            size_bytes,
            mime_type: row.mime_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        file.validate()?;
        Ok(file)
    }
}

fn into_files(rows: Vec<FileRow>) -> AppResult<Vec<File>> {
    rows.into_iter().map(File::try_from).collect()
}

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID within an owner's namespace.
    pub async fn find_by_id(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {COLUMNS} FROM files WHERE owner_id = ? AND id = ?"
        ))
        .bind(owner.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?;
        row.map(File::try_from).transpose()
    }

    /// List files directly inside a folder (`None` for the owner's root).
    pub async fn find_by_folder(
        &self,
        owner: &OwnerId,
        folder: Option<&FolderId>,
    ) -> AppResult<Vec<File>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {COLUMNS} FROM files WHERE owner_id = ? AND folder_id IS ? \
             ORDER BY name ASC, created_at ASC, id ASC"
        ))
        .bind(owner.as_str())
        .bind(folder.map(FolderId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;
        into_files(rows)
    }

    /// List every file of an owner.
    pub async fn find_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<File>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {COLUMNS} FROM files WHERE owner_id = ?"
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list owner files", e))?;
        into_files(rows)
    }

    /// Distinct owners with at least one file.
    pub async fn find_owners(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT owner_id FROM files")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list owners", e))
    }

    /// Insert a file unless its id is already used by a folder.
    ///
    /// Returns `false` when the id clashes with a folder.
    pub async fn create(&self, file: &File) -> AppResult<bool> {
        let size = i64::try_from(file.size_bytes)
            .map_err(|_| AppError::validation(format!("File {} is too large", file.id)))?;
        let result = sqlx::query(
            "INSERT INTO files (id, owner_id, folder_id, name, object_path, url, size_bytes, \
             mime_type, schema_version, created_at, updated_at) \
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM folders WHERE id = ?)",
        )
        .bind(file.id.as_str())
        .bind(file.owner_id.as_str())
        .bind(file.folder_id.as_ref().map(FolderId::as_str))
        .bind(&file.name)
        .bind(&file.locator.path)
        .bind(&file.locator.url)
        .bind(size)
        .bind(file.mime_type.as_deref())
        .bind(i64::from(file.schema_version))
        .bind(file.created_at)
        .bind(file.updated_at)
        .bind(file.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "File"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Update name, folder and timestamp. Returns whether a row matched.
    pub async fn update(&self, file: &File) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET name = ?, folder_id = ?, updated_at = ? \
             WHERE owner_id = ? AND id = ?",
        )
        .bind(&file.name)
        .bind(file.folder_id.as_ref().map(FolderId::as_str))
        .bind(file.updated_at)
        .bind(file.owner_id.as_str())
        .bind(file.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a file row.
    pub async fn delete(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE owner_id = ? AND id = ?")
            .bind(owner.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }
}
