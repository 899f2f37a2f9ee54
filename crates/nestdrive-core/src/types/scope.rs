//! Namespace scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{FolderId, OwnerId};

/// A slice of one owner's namespace: the direct children of a folder, or of
/// the owner's root when `parent_id` is `None`.
///
/// Listings, live subscriptions, and the client view cache are all keyed by
/// scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Owner of every record in the scope.
    pub owner_id: OwnerId,
    /// Containing folder, or `None` for the owner's root.
    pub parent_id: Option<FolderId>,
}

impl Scope {
    /// Scope for the direct children of `parent_id`.
    pub fn new(owner_id: OwnerId, parent_id: Option<FolderId>) -> Self {
        Self {
            owner_id,
            parent_id,
        }
    }

    /// The owner's root scope.
    pub fn root(owner_id: OwnerId) -> Self {
        Self::new(owner_id, None)
    }

    /// Whether this is the owner's root scope.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Stable channel name used by the live query engine.
    pub fn channel_name(&self) -> String {
        match &self.parent_id {
            Some(parent) => format!("scope:{}:{}", self.owner_id, parent),
            None => format!("scope:{}:root", self.owner_id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.channel_name())
    }
}
