//! Uploads, downloads, and the object/record write ordering.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use nestdrive_core::config::AppConfig;
use nestdrive_core::error::ErrorKind;
use nestdrive_storage::{ProgressCallback, UploadProgress};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_upload_list_resolve_fetch_round_trip() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let docs = app.state.folders.create_folder(&u1, None, "Docs").await.unwrap();
    let payload = Bytes::from_static(b"hello, world");

    let file = app
        .state
        .uploads
        .upload(&u1, Some(docs.id.clone()), "hello world.txt", payload.clone(), None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(file.size_bytes, 12);

    let listing = app.state.folders.list_children(&u1, Some(&docs.id)).await.unwrap();
    assert_eq!(listing.files.len(), 1);
    assert_eq!(listing.files[0].id, file.id);

    let url = app.state.files.resolve_url(&u1, &file.id).await.unwrap();
    assert!(url.contains("hello%20world.txt"));
    let fetched = app.state.objects.fetch_url(&url).await.unwrap();
    assert_eq!(fetched, payload);
}

#[tokio::test]
async fn test_failed_record_write_removes_object() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    app.store.fail_file_inserts.store(true, Ordering::SeqCst);

    let err = app
        .state
        .uploads
        .upload(&u1, None, "a.txt", Bytes::from_static(b"abc"), None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert_eq!(app.object_count().await, 0);
}

#[tokio::test]
async fn test_failed_compensation_is_partial_failure_then_reconciled() {
    let mut config = AppConfig::default();
    config.worker.orphan_grace_seconds = 0;
    let app = TestApp::with_config(config);
    let u1 = app.ctx("u1");
    app.store.fail_file_inserts.store(true, Ordering::SeqCst);
    app.objects.fail_deletes.store(true, Ordering::SeqCst);

    let err = app
        .state
        .uploads
        .upload(&u1, None, "a.txt", Bytes::from_static(b"abc"), None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialFailure);
    assert_eq!(app.object_count().await, 1);

    app.objects.fail_deletes.store(false, Ordering::SeqCst);
    let report = app.state.reconciler.run().await.unwrap();
    assert_eq!(report.orphan_objects_removed, 1);
    assert_eq!(app.object_count().await, 0);
}

#[tokio::test]
async fn test_failed_record_delete_leaves_dangling_record_for_sweep() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();
    let file = app
        .state
        .uploads
        .upload(&u1, None, "a.txt", Bytes::from_static(b"abc"), None, &cancel)
        .await
        .unwrap();

    app.store.fail_file_deletes.store(true, Ordering::SeqCst);
    let err = app.state.files.delete_file(&u1, &file.id, &cancel).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialFailure);
    assert_eq!(app.object_count().await, 0);

    app.store.fail_file_deletes.store(false, Ordering::SeqCst);
    let report = app.state.reconciler.run().await.unwrap();
    assert_eq!(report.dangling_records_removed, 1);
    assert!(app.state.files.get_file(&u1, &file.id).await.is_err());
}

#[tokio::test]
async fn test_object_delete_failure_keeps_record() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();
    let file = app
        .state
        .uploads
        .upload(&u1, None, "a.txt", Bytes::from_static(b"abc"), None, &cancel)
        .await
        .unwrap();

    app.objects.fail_deletes.store(true, Ordering::SeqCst);
    let err = app.state.files.delete_file(&u1, &file.id, &cancel).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Storage);
    assert!(app.state.files.get_file(&u1, &file.id).await.is_ok());
}

#[tokio::test]
async fn test_cancel_during_upload_leaves_no_object() {
    let mut config = AppConfig::default();
    config.storage.chunk_size_bytes = 4;
    let app = TestApp::with_config(config);
    let u1 = app.ctx("u1");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let progress: ProgressCallback = Arc::new(move |p: UploadProgress| {
        if p.bytes_done >= 4 {
            trigger.cancel();
        }
    });

    let err = app
        .state
        .uploads
        .upload(&u1, None, "big.bin", Bytes::from_static(b"0123456789ab"), Some(progress), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(app.object_count().await, 0);
    assert!(app.state.store.list_all_files(&u1.owner_id).await.unwrap().is_empty());
}
