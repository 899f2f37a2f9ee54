//! Folder tree assembly from flat adjacency-list records.

use std::collections::HashMap;

use nestdrive_core::types::FolderId;
use nestdrive_entity::{File, Folder, FolderNode, FolderTree};

/// Build the tree of an owner's folders. Folders whose parent is missing
/// are shown at the root so nothing disappears from view.
pub fn build_tree(folders: Vec<Folder>, files: &[File]) -> FolderTree {
    let mut file_counts: HashMap<&FolderId, u64> = HashMap::new();
    for file in files {
        if let Some(folder_id) = &file.folder_id {
            *file_counts.entry(folder_id).or_default() += 1;
        }
    }

    let known: std::collections::HashSet<FolderId> = folders.iter().map(|f| f.id.clone()).collect();
    let mut children: HashMap<Option<FolderId>, Vec<Folder>> = HashMap::new();
    for folder in folders {
        let parent = folder.parent_id.clone().filter(|p| known.contains(p));
        children.entry(parent).or_default().push(folder);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    fn build(
        parent: Option<FolderId>,
        depth: usize,
        children: &mut HashMap<Option<FolderId>, Vec<Folder>>,
        file_counts: &HashMap<&FolderId, u64>,
    ) -> Vec<FolderNode> {
        let Some(siblings) = children.remove(&parent) else {
            return Vec::new();
        };
        siblings
            .into_iter()
            .map(|folder| FolderNode {
                file_count: file_counts.get(&folder.id).copied().unwrap_or(0),
                children: build(Some(folder.id.clone()), depth + 1, children, file_counts),
                id: folder.id,
                name: folder.name,
                depth,
            })
            .collect()
    }

    let total_folders = known.len() as u64;
    let roots = build(None, 0, &mut children, &file_counts);
    FolderTree {
        roots,
        total_folders,
    }
}
