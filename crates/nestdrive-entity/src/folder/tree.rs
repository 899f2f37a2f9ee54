//! Folder tree structures for hierarchical display.

use serde::{Deserialize, Serialize};

use nestdrive_core::types::FolderId;

/// A node in a folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    /// Folder ID.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Depth level (0 for folders at the root of the tree).
    pub depth: usize,
    /// Number of files directly inside this folder.
    pub file_count: u64,
    /// Child folder nodes.
    pub children: Vec<FolderNode>,
}

/// A complete folder tree rooted at an owner's root or at a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderTree {
    /// The root node(s) of the tree.
    pub roots: Vec<FolderNode>,
    /// Total number of folders in the tree.
    pub total_folders: u64,
}

impl FolderTree {
    /// Create an empty folder tree.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            total_folders: 0,
        }
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<F: FnMut(&FolderNode)>(&self, mut visit: F) {
        fn go<F: FnMut(&FolderNode)>(node: &FolderNode, visit: &mut F) {
            visit(node);
            for child in &node.children {
                go(child, visit);
            }
        }
        for root in &self.roots {
            go(root, &mut visit);
        }
    }
}
