//! Last-known-good scope snapshot plus optimistic local changes.

use std::sync::Arc;

use nestdrive_core::types::{FileId, FolderId, Scope};
use nestdrive_entity::{File, Folder, Listing, Snapshot};

/// Handle of one optimistic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(u64);

/// A local change not yet known to be reflected in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// A folder being created.
    AddFolder(Folder),
    /// A file being uploaded.
    AddFile(File),
    /// A folder being deleted.
    RemoveFolder(FolderId),
    /// A file being deleted.
    RemoveFile(FileId),
    /// A folder being renamed.
    RenameFolder {
        /// The folder.
        id: FolderId,
        /// Its new name.
        name: String,
    },
    /// A file being renamed.
    RenameFile {
        /// The file.
        id: FileId,
        /// Its new name.
        name: String,
    },
}

impl PendingChange {
    /// Whether `listing` already shows the effect of this change.
    fn reflected_in(&self, listing: &Listing) -> bool {
        let folder = |id: &FolderId| listing.folders.iter().find(|f| &f.id == id);
        let file = |id: &FileId| listing.files.iter().find(|f| &f.id == id);
        match self {
            Self::AddFolder(f) => folder(&f.id).is_some(),
            Self::AddFile(f) => file(&f.id).is_some(),
            Self::RemoveFolder(id) => folder(id).is_none(),
            Self::RemoveFile(id) => file(id).is_none(),
            Self::RenameFolder { id, name } => folder(id).is_none_or(|f| &f.name == name),
            Self::RenameFile { id, name } => file(id).is_none_or(|f| &f.name == name),
        }
    }

    fn apply_to(&self, listing: &mut Listing) {
        match self {
            Self::AddFolder(f) => {
                if !listing.folders.iter().any(|x| x.id == f.id) {
                    listing.folders.push(f.clone());
                }
            }
            Self::AddFile(f) => {
                if !listing.files.iter().any(|x| x.id == f.id) {
                    listing.files.push(f.clone());
                }
            }
            Self::RemoveFolder(id) => listing.folders.retain(|f| &f.id != id),
            Self::RemoveFile(id) => listing.files.retain(|f| &f.id != id),
            Self::RenameFolder { id, name } => {
                for f in listing.folders.iter_mut().filter(|f| &f.id == id) {
                    f.name = name.clone();
                }
            }
            Self::RenameFile { id, name } => {
                for f in listing.files.iter_mut().filter(|f| &f.id == id) {
                    f.name = name.clone();
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PendingOp {
    id: OpId,
    change: PendingChange,
    /// The service call succeeded; the op only waits for a snapshot.
    confirmed: bool,
}

/// State of one scope as shown to the user.
///
/// Snapshots replace each other wholesale; a snapshot whose sequence is not
/// newer than the current one is ignored. Pending changes are layered on
/// top until a snapshot shows them (or they are rolled back).
#[derive(Debug, Clone)]
pub struct ViewCache {
    scope: Scope,
    snapshot: Option<Arc<Snapshot>>,
    pending: Vec<PendingOp>,
    next_op: u64,
    last_error: Option<String>,
}

impl ViewCache {
    /// Create an empty cache for a scope.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            snapshot: None,
            pending: Vec::new(),
            next_op: 0,
            last_error: None,
        }
    }

    /// The scope this cache mirrors.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Sequence of the current snapshot.
    pub fn sequence(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.sequence)
    }

    /// The last snapshot received.
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    /// Number of changes not yet reflected in a snapshot.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Message of the last failed change, for inline display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Show an error for a change that never started.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Dismiss the inline error.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Record an optimistic change.
    pub fn begin(&mut self, change: PendingChange) -> OpId {
        self.next_op += 1;
        let id = OpId(self.next_op);
        self.pending.push(PendingOp {
            id,
            change,
            confirmed: false,
        });
        self.last_error = None;
        id
    }

    /// Mark a change as committed by the service.
    pub fn confirm(&mut self, op: OpId) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.id == op) {
            pending.confirmed = true;
        }
        self.prune();
    }

    /// Mark a change as committed, replacing its placeholder with the
    /// record the service returned.
    pub fn confirm_with(&mut self, op: OpId, committed: PendingChange) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.id == op) {
            pending.change = committed;
            pending.confirmed = true;
        }
        self.prune();
    }

    /// Undo a change the service rejected.
    pub fn rollback(&mut self, op: OpId, message: impl Into<String>) {
        self.pending.retain(|p| p.id != op);
        self.last_error = Some(message.into());
    }

    /// Replace the snapshot. Returns `false` when the snapshot is for
    /// another scope or not newer than the current one.
    pub fn apply_snapshot(&mut self, snapshot: Arc<Snapshot>) -> bool {
        if snapshot.scope != self.scope {
            return false;
        }
        if self.sequence().is_some_and(|current| snapshot.sequence <= current) {
            return false;
        }
        self.snapshot = Some(snapshot);
        self.prune();
        true
    }

    /// Drop confirmed changes the current snapshot already shows. Adds and
    /// removals are dropped as soon as the snapshot shows them, confirmed or
    /// not, since the placeholder carries the id the record is written under.
    fn prune(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let listing = &snapshot.listing;
        self.pending.retain(|p| {
            let by_id = !matches!(
                p.change,
                PendingChange::RenameFolder { .. } | PendingChange::RenameFile { .. }
            );
            !((p.confirmed || by_id) && p.change.reflected_in(listing))
        });
    }

    /// The listing to display: the snapshot with pending changes applied.
    pub fn listing(&self) -> Listing {
        let mut listing = self
            .snapshot
            .as_ref()
            .map(|s| s.listing.clone())
            .unwrap_or_default();
        for pending in &self.pending {
            pending.change.apply_to(&mut listing);
        }
        listing.sort();
        listing
    }
}
