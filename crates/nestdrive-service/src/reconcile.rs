//! Reconciliation between the namespace store and the object store.
//!
//! Uploads and deletes touch the two stores one after the other, so a crash
//! or a failed compensation can leave an object without a record, or a
//! record whose object is gone. The sweep repairs both.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use nestdrive_core::config::WorkerConfig;
use nestdrive_core::events::{NamespaceEvent, NamespaceEventKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::NamespaceObserver;
use nestdrive_database::NamespaceStore;
use nestdrive_storage::ObjectStoreAdapter;

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// File records examined.
    pub records_scanned: usize,
    /// Objects examined.
    pub objects_scanned: usize,
    /// Records removed because their object was missing.
    pub dangling_records_removed: usize,
    /// Objects removed because no record referenced them.
    pub orphan_objects_removed: usize,
    /// Unreferenced objects kept because they are younger than the grace period.
    pub orphan_objects_deferred: usize,
}

/// Repairs divergence between file records and stored objects.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<dyn NamespaceStore>,
    objects: ObjectStoreAdapter,
    observer: Arc<dyn NamespaceObserver>,
    grace: Duration,
}

impl Reconciler {
    /// Creates a new reconciler.
    pub fn new(
        store: Arc<dyn NamespaceStore>,
        objects: ObjectStoreAdapter,
        observer: Arc<dyn NamespaceObserver>,
        config: &WorkerConfig,
    ) -> Self {
        let grace = Duration::seconds(config.orphan_grace_seconds.min(u64::from(u32::MAX)) as i64);
        Self {
            store,
            objects,
            observer,
            grace,
        }
    }

    /// Run one sweep.
    ///
    /// Objects are only removed once they are older than the grace period,
    /// which leaves room for uploads whose record is still being written.
    pub async fn run(&self) -> AppResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let mut referenced = HashSet::new();

        for owner in self.store.list_owners().await? {
            for file in self.store.list_all_files(&owner).await? {
                report.records_scanned += 1;
                if self.objects.store().exists(&file.locator.path).await? {
                    referenced.insert(file.locator.path);
                    continue;
                }
                if self.store.delete_file(&owner, &file.id).await? {
                    warn!(owner_id = %owner, file_id = %file.id, "Removed file record without object");
                    report.dangling_records_removed += 1;
                    self.observer
                        .on_event(&NamespaceEvent::new(
                            owner.clone(),
                            NamespaceEventKind::FileDeleted {
                                file_id: file.id.clone(),
                                folder_id: file.folder_id.clone(),
                            },
                        ))
                        .await;
                }
            }
        }

        let cutoff = Utc::now() - self.grace;
        for object in self.objects.list("").await? {
            report.objects_scanned += 1;
            if referenced.contains(&object.path) {
                continue;
            }
            let old_enough = object.last_modified.is_some_and(|t| t <= cutoff);
            if !old_enough {
                report.orphan_objects_deferred += 1;
                continue;
            }
            self.objects.delete(&object.path).await?;
            warn!(path = %object.path, "Removed object without file record");
            report.orphan_objects_removed += 1;
        }

        info!(
            records = report.records_scanned,
            objects = report.objects_scanned,
            dangling_records_removed = report.dangling_records_removed,
            orphan_objects_removed = report.orphan_objects_removed,
            "Reconciliation sweep finished"
        );
        Ok(report)
    }
}
