//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nestdrive_core::error::AppError;
use nestdrive_core::types::{FileId, FolderId, OwnerId, Scope};

use super::locator::Locator;
use crate::name::validate_name;
use crate::record::SCHEMA_VERSION;

/// A file stored in NestDrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Record layout version.
    pub schema_version: u32,
    /// Unique file identifier.
    pub id: FileId,
    /// The file name (including extension).
    pub name: String,
    /// The file owner.
    pub owner_id: OwnerId,
    /// Containing folder (`None` for files at the owner's root).
    pub folder_id: Option<FolderId>,
    /// Where the payload is stored.
    pub locator: Locator,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// MIME type, when known.
    pub mime_type: Option<String>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Build a new file record, validating the name.
    pub fn new(
        id: FileId,
        owner_id: OwnerId,
        folder_id: Option<FolderId>,
        name: impl Into<String>,
        locator: Locator,
        size_bytes: u64,
    ) -> Result<Self, AppError> {
        let name = name.into();
        validate_name(&name)?;
        let now = Utc::now();
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            id,
            name,
            owner_id,
            folder_id,
            locator,
            size_bytes,
            mime_type: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach a MIME type.
    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// The scope this file is listed in.
    pub fn scope(&self) -> Scope {
        Scope::new(self.owner_id.clone(), self.folder_id.clone())
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }

    /// Rename the file. The object path is left untouched.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), AppError> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check the record invariants.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(AppError::serialization(format!(
                "File {} has unsupported schema version {}",
                self.id, self.schema_version
            )));
        }
        if self.locator.path.is_empty() {
            return Err(AppError::validation(format!(
                "File {} has no object path",
                self.id
            )));
        }
        validate_name(&self.name)
    }
}
