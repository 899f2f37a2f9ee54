//! Namespace rules.

use serde::{Deserialize, Serialize};

/// What happens when a folder that still has children is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Remove every descendant folder and file (objects first), then the
    /// folder itself.
    Cascade,
    /// Refuse to delete a folder that has sub-folders or files.
    RejectNonEmpty,
}

/// Namespace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Folder deletion policy.
    #[serde(default = "default_delete_policy")]
    pub delete_policy: DeletePolicy,
    /// How many fresh ids to try when a generated id already exists.
    #[serde(default = "default_id_attempts")]
    pub id_generation_attempts: u32,
    /// Depth guard for ancestry walks; a longer chain means a corrupted tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            delete_policy: default_delete_policy(),
            id_generation_attempts: default_id_attempts(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_delete_policy() -> DeletePolicy {
    DeletePolicy::Cascade
}

fn default_id_attempts() -> u32 {
    5
}

fn default_max_depth() -> usize {
    256
}
