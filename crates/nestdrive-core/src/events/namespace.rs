//! Folder and file mutation events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{FileId, FolderId, OwnerId, Scope};

/// What happened to the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NamespaceEventKind {
    /// A folder was created.
    FolderCreated {
        /// The new folder.
        folder_id: FolderId,
        /// Its parent.
        parent_id: Option<FolderId>,
        /// Its name.
        name: String,
    },
    /// A folder was renamed.
    FolderRenamed {
        /// The folder.
        folder_id: FolderId,
        /// Its parent.
        parent_id: Option<FolderId>,
        /// The new name.
        name: String,
    },
    /// A folder was moved to a different parent.
    FolderMoved {
        /// The folder.
        folder_id: FolderId,
        /// Previous parent.
        from_parent_id: Option<FolderId>,
        /// New parent.
        to_parent_id: Option<FolderId>,
    },
    /// A folder was deleted.
    FolderDeleted {
        /// The folder.
        folder_id: FolderId,
        /// Its former parent.
        parent_id: Option<FolderId>,
    },
    /// A file record was created (its object already exists).
    FileCreated {
        /// The new file.
        file_id: FileId,
        /// Containing folder.
        folder_id: Option<FolderId>,
        /// File name.
        name: String,
        /// Payload size in bytes.
        size_bytes: u64,
    },
    /// A file was renamed.
    FileRenamed {
        /// The file.
        file_id: FileId,
        /// Containing folder.
        folder_id: Option<FolderId>,
        /// The new name.
        name: String,
    },
    /// A file record was deleted.
    FileDeleted {
        /// The file.
        file_id: FileId,
        /// Its former folder.
        folder_id: Option<FolderId>,
    },
}

/// A committed namespace mutation with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event was committed.
    pub timestamp: DateTime<Utc>,
    /// Owner of the mutated records.
    pub owner_id: OwnerId,
    /// The event payload.
    pub kind: NamespaceEventKind,
}

impl NamespaceEvent {
    /// Create a new event stamped now.
    pub fn new(owner_id: OwnerId, kind: NamespaceEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            owner_id,
            kind,
        }
    }

    /// Every scope whose listing changed because of this event.
    pub fn affected_scopes(&self) -> Vec<Scope> {
        let owner = || self.owner_id.clone();
        match &self.kind {
            NamespaceEventKind::FolderCreated { parent_id, .. }
            | NamespaceEventKind::FolderRenamed { parent_id, .. }
            | NamespaceEventKind::FolderDeleted { parent_id, .. } => {
                vec![Scope::new(owner(), parent_id.clone())]
            }
            NamespaceEventKind::FolderMoved {
                from_parent_id,
                to_parent_id,
                ..
            } => {
                let mut scopes = vec![Scope::new(owner(), from_parent_id.clone())];
                if from_parent_id != to_parent_id {
                    scopes.push(Scope::new(owner(), to_parent_id.clone()));
                }
                scopes
            }
            NamespaceEventKind::FileCreated { folder_id, .. }
            | NamespaceEventKind::FileRenamed { folder_id, .. }
            | NamespaceEventKind::FileDeleted { folder_id, .. } => {
                vec![Scope::new(owner(), folder_id.clone())]
            }
        }
    }
}
