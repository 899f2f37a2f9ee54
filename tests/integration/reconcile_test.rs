//! Reconciliation sweeps across both stores.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use nestdrive_core::traits::ObjectStore;
use nestdrive_worker::JobExecutor;
use nestdrive_worker::jobs::{RECONCILE_JOB, ReconcileJobHandler};

use crate::helpers::{TestApp, within};

#[tokio::test]
async fn test_consistent_stores_are_left_alone() {
    let app = TestApp::new();
    let ctx = app.ctx("alice");
    let cancel = CancellationToken::new();
    for name in ["a.txt", "b.txt"] {
        app.state
            .uploads
            .upload(&ctx, None, name, Bytes::from_static(b"x"), None, &cancel)
            .await
            .unwrap();
    }

    let report = app.state.reconciler.run().await.unwrap();
    assert_eq!(report.records_scanned, 2);
    assert_eq!(report.objects_scanned, 2);
    assert_eq!(report.dangling_records_removed, 0);
    assert_eq!(report.orphan_objects_removed, 0);
    assert_eq!(app.object_count().await, 2);
}

#[tokio::test]
async fn test_old_orphans_go_and_fresh_ones_stay() {
    let app = TestApp::new();
    let old = Utc::now() - Duration::hours(1);
    app.objects
        .inner
        .put_at("alice/root/stale/old.bin", Bytes::from_static(b"old"), old)
        .await;
    app.objects
        .inner
        .put_at("alice/root/inflight/new.bin", Bytes::from_static(b"new"), Utc::now())
        .await;

    let report = app.state.reconciler.run().await.unwrap();
    assert_eq!(report.orphan_objects_removed, 1);
    assert_eq!(report.orphan_objects_deferred, 1);
    assert!(!app.objects.exists("alice/root/stale/old.bin").await.unwrap());
    assert!(app.objects.exists("alice/root/inflight/new.bin").await.unwrap());
}

#[tokio::test]
async fn test_dangling_record_removal_reaches_subscribers() {
    let app = TestApp::new();
    let ctx = app.ctx("alice");
    let cancel = CancellationToken::new();
    let file = app
        .state
        .uploads
        .upload(&ctx, None, "gone.txt", Bytes::from_static(b"g"), None, &cancel)
        .await
        .unwrap();

    let mut live = app.state.engine.subscribe(&ctx.owner_id, None).await.unwrap();
    assert_eq!(within(live.next()).await.unwrap().listing.files.len(), 1);

    // The object disappears behind the service's back.
    app.objects.inner.delete(&file.locator.path).await.unwrap();

    let report = app.state.reconciler.run().await.unwrap();
    assert_eq!(report.dangling_records_removed, 1);

    let snapshot = within(live.next()).await.unwrap();
    assert!(snapshot.listing.files.is_empty());
}

#[tokio::test]
async fn test_reconcile_job_returns_report() {
    let app = TestApp::new();
    app.objects
        .inner
        .put_at(
            "bob/root/stale/old.bin",
            Bytes::from_static(b"old"),
            Utc::now() - Duration::days(1),
        )
        .await;

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ReconcileJobHandler::new(app.state.reconciler.clone())));

    let value = executor.execute(RECONCILE_JOB).await.unwrap();
    assert_eq!(value["orphan_objects_removed"], 1);
    assert_eq!(app.object_count().await, 0);
}
