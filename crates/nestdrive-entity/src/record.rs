//! Tagged namespace records.

use serde::{Deserialize, Serialize};

use nestdrive_core::error::AppError;
use nestdrive_core::types::OwnerId;

use crate::file::File;
use crate::folder::Folder;

/// Current record layout version. Records carrying any other version are
/// rejected at the store boundary.
pub const SCHEMA_VERSION: u32 = 1;

/// A folder or file record, tagged by kind when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamespaceRecord {
    /// A folder record.
    Folder(Folder),
    /// A file record.
    File(File),
}

impl NamespaceRecord {
    /// Record id as a string.
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(folder) => folder.id.as_str(),
            Self::File(file) => file.id.as_str(),
        }
    }

    /// Record owner.
    pub fn owner_id(&self) -> &OwnerId {
        match self {
            Self::Folder(folder) => &folder.owner_id,
            Self::File(file) => &file.owner_id,
        }
    }

    /// Record name.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::File(file) => &file.name,
        }
    }

    /// Validate the record.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            Self::Folder(folder) => folder.validate(),
            Self::File(file) => file.validate(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }
}

impl From<Folder> for NamespaceRecord {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<File> for NamespaceRecord {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}
