//! SQLite repositories for namespace records.

pub mod file;
pub mod folder;

pub use file::FileRepository;
pub use folder::FolderRepository;

use nestdrive_core::error::{AppError, ErrorKind};

/// Map an insert failure, turning primary key violations into `Conflict`.
pub(crate) fn map_insert_error(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::with_source(ErrorKind::Conflict, format!("{what} id is already in use"), err)
        }
        _ => AppError::with_source(ErrorKind::Database, format!("Failed to insert {what}"), err),
    }
}

/// Convert a stored schema version column.
pub(crate) fn schema_version(raw: i64, id: &str) -> Result<u32, AppError> {
    u32::try_from(raw).map_err(|_| {
        AppError::serialization(format!("Record {id} has invalid schema version {raw}"))
    })
}
