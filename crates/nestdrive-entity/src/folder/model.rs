//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nestdrive_core::error::AppError;
use nestdrive_core::types::{FolderId, OwnerId, Scope};

use crate::name::validate_name;
use crate::record::SCHEMA_VERSION;

/// A folder in an owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Record layout version.
    pub schema_version: u32,
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// The folder owner.
    pub owner_id: OwnerId,
    /// Parent folder ID (`None` for folders at the owner's root).
    pub parent_id: Option<FolderId>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Build a new folder record, validating the name.
    pub fn new(
        id: FolderId,
        owner_id: OwnerId,
        parent_id: Option<FolderId>,
        name: impl Into<String>,
    ) -> Result<Self, AppError> {
        let name = name.into();
        validate_name(&name)?;
        let now = Utc::now();
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            id,
            name,
            owner_id,
            parent_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if this folder sits at the owner's root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The scope this folder is listed in.
    pub fn scope(&self) -> Scope {
        Scope::new(self.owner_id.clone(), self.parent_id.clone())
    }

    /// The scope holding this folder's children.
    pub fn child_scope(&self) -> Scope {
        Scope::new(self.owner_id.clone(), Some(self.id.clone()))
    }

    /// Rename the folder.
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
                "Folder {} has unsupported schema version {}",
                self.id, self.schema_version
            )));
        }
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(AppError::validation(format!(
                "Folder {} cannot be its own parent",
                self.id
            )));
        }
        validate_name(&self.name)
    }
}
