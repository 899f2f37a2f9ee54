//! Scope listings and live query snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nestdrive_core::types::Scope;

use crate::file::File;
use crate::folder::Folder;

/// The direct children of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Sub-folders, ordered by name.
    pub folders: Vec<Folder>,
    /// Files, ordered by name.
    pub files: Vec<File>,
}

impl Listing {
    /// Whether the scope has no entries.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    /// Sort entries into the canonical listing order (name, then creation
    /// time, then id, so duplicate names still list deterministically).
    pub fn sort(&mut self) {
        self.folders.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        self.files.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
    }
}

/// A full materialized listing of a scope at one point in time.
///
/// Snapshots replace each other wholesale; `sequence` increases with every
/// snapshot published for the same scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The scope that was queried.
    pub scope: Scope,
    /// Per-scope publication counter.
    pub sequence: u64,
    /// The scope contents.
    pub listing: Listing,
    /// When the query ran.
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot taken now.
    pub fn new(scope: Scope, sequence: u64, listing: Listing) -> Arc<Self> {
        Arc::new(Self {
            scope,
            sequence,
            listing,
            taken_at: Utc::now(),
        })
    }
}
