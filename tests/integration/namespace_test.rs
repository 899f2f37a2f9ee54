//! Folder and file namespace behavior.

use std::collections::HashSet;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use nestdrive_core::config::{AppConfig, DeletePolicy};
use nestdrive_core::error::ErrorKind;
use nestdrive_core::types::{FolderId, id};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_create_list_delete_folder_twice() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();

    let f1 = app.state.folders.create_folder(&u1, None, "Docs").await.unwrap();
    let root = app.state.folders.list_children(&u1, None).await.unwrap();
    let matches: Vec<_> = root.folders.iter().filter(|f| f.id == f1.id).collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Docs");

    app.state.folders.delete_folder(&u1, &f1.id, &cancel).await.unwrap();
    let root = app.state.folders.list_children(&u1, None).await.unwrap();
    assert!(root.folders.iter().all(|f| f.id != f1.id));

    app.state.folders.delete_folder(&u1, &f1.id, &cancel).await.unwrap();
}

#[tokio::test]
async fn test_file_delete_is_idempotent() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();
    let file = app
        .state
        .uploads
        .upload(&u1, None, "a.txt", Bytes::from_static(b"a"), None, &cancel)
        .await
        .unwrap();

    app.state.files.delete_file(&u1, &file.id, &cancel).await.unwrap();
    app.state.files.delete_file(&u1, &file.id, &cancel).await.unwrap();
    assert_eq!(app.object_count().await, 0);
}

#[tokio::test]
async fn test_owners_never_see_each_other() {
    let app = TestApp::new();
    let alice = app.ctx("alice");
    let bob = app.ctx("bob");
    let cancel = CancellationToken::new();

    let folder = app.state.folders.create_folder(&alice, None, "Mine").await.unwrap();
    let file = app
        .state
        .uploads
        .upload(&alice, Some(folder.id.clone()), "secret.txt", Bytes::from_static(b"s"), None, &cancel)
        .await
        .unwrap();

    assert!(app.state.folders.list_children(&bob, None).await.unwrap().is_empty());
    assert!(
        app.state
            .folders
            .list_children(&bob, Some(&folder.id))
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        app.state.files.download(&bob, &file.id).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        app.state.files.rename_file(&bob, &file.id, "x").await.unwrap_err().kind,
        ErrorKind::NotFound
    );

    // Bob's delete is a no-op on Alice's data.
    app.state.folders.delete_folder(&bob, &folder.id, &cancel).await.unwrap();
    assert!(app.state.folders.get_folder(&alice, &folder.id).await.is_ok());
    assert_eq!(app.state.folders.tree(&alice).await.unwrap().total_folders, 1);
}

#[tokio::test]
async fn test_cascade_removes_descendants_and_objects() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();

    let top = app.state.folders.create_folder(&u1, None, "top").await.unwrap();
    let mut parent = top.id.clone();
    for depth in 0..4 {
        let child = app
            .state
            .folders
            .create_folder(&u1, Some(parent.clone()), &format!("level-{depth}"))
            .await
            .unwrap();
        app.state
            .uploads
            .upload(&u1, Some(child.id.clone()), "f.bin", Bytes::from_static(b"f"), None, &cancel)
            .await
            .unwrap();
        parent = child.id;
    }
    let keep = app.state.folders.create_folder(&u1, None, "keep").await.unwrap();
    assert_eq!(app.object_count().await, 4);

    app.state.folders.delete_folder(&u1, &top.id, &cancel).await.unwrap();

    let folders = app.state.store.list_all_folders(&u1.owner_id).await.unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].id, keep.id);
    assert!(app.state.store.list_all_files(&u1.owner_id).await.unwrap().is_empty());
    assert_eq!(app.object_count().await, 0);
}

#[tokio::test]
async fn test_reject_non_empty_keeps_everything() {
    let mut config = AppConfig::default();
    config.namespace.delete_policy = DeletePolicy::RejectNonEmpty;
    let app = TestApp::with_config(config);
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();

    let folder = app.state.folders.create_folder(&u1, None, "full").await.unwrap();
    app.state
        .uploads
        .upload(&u1, Some(folder.id.clone()), "f.bin", Bytes::from_static(b"f"), None, &cancel)
        .await
        .unwrap();

    let err = app.state.folders.delete_folder(&u1, &folder.id, &cancel).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.object_count().await, 1);
    assert!(app.state.folders.get_folder(&u1, &folder.id).await.is_ok());
}

#[tokio::test]
async fn test_move_rejects_descendant_target() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let a = app.state.folders.create_folder(&u1, None, "a").await.unwrap();
    let b = app.state.folders.create_folder(&u1, Some(a.id.clone()), "b").await.unwrap();
    let c = app.state.folders.create_folder(&u1, Some(b.id.clone()), "c").await.unwrap();

    let err = app
        .state
        .folders
        .move_folder(&u1, &a.id, Some(c.id.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.state.folders.move_folder(&u1, &c.id, Some(a.id.clone())).await.unwrap();
    let children = app.state.folders.list_children(&u1, Some(&a.id)).await.unwrap();
    assert_eq!(children.folders.len(), 2);
}

#[tokio::test]
async fn test_nested_create_requires_existing_parent() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let err = app
        .state
        .folders
        .create_folder(&u1, Some(FolderId::generate()), "orphan")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.state.store.list_all_folders(&u1.owner_id).await.unwrap().is_empty());
}

#[test]
fn test_ten_thousand_generated_ids_are_unique() {
    let ids: HashSet<String> = (0..10_000).map(|_| id::generate()).collect();
    assert_eq!(ids.len(), 10_000);
    assert!(ids.iter().all(|s| id::is_valid_id(s)));
}

#[tokio::test]
async fn test_cannot_claim_another_owners_object() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let u2 = app.ctx("u2");
    let cancel = CancellationToken::new();

    let secret = app
        .state
        .uploads
        .upload(&u1, None, "secret.txt", Bytes::from_static(b"TOPSECRET"), None, &cancel)
        .await
        .unwrap();

    let err = app
        .state
        .files
        .create_file(&u2, None, "mine.txt", secret.locator.clone(), 9, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.state.folders.list_children(&u2, None).await.unwrap().is_empty());

    let (_, data) = app.state.files.download(&u1, &secret.id).await.unwrap();
    assert_eq!(data, Bytes::from_static(b"TOPSECRET"));
}

#[tokio::test]
async fn test_create_file_in_missing_folder_is_not_found() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");

    let err = app
        .state
        .files
        .create_file(
            &u1,
            Some(FolderId::generate()),
            "a.txt",
            nestdrive_entity::Locator::new("u1/root/x/a.txt", "u"),
            1,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
