//! The namespace against SQLite and the local filesystem object store.

use bytes::Bytes;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use nestdrive_core::config::AppConfig;
use nestdrive_core::types::OwnerId;
use nestdrive_service::{AppState, SessionContext};

fn disk_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite://{}/meta/nestdrive.db", dir.path().display());
    config.storage.provider = "local".to_string();
    config.storage.local.root_path = dir.path().join("objects").display().to_string();
    config
}

fn alice() -> SessionContext {
    SessionContext::new(OwnerId::parse("alice").unwrap())
}

#[tokio::test]
async fn test_namespace_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let ctx = alice();
    let cancel = CancellationToken::new();

    let (docs, file) = {
        let state = AppState::from_config(disk_config(&dir)).await.unwrap();
        let docs = state.folders.create_folder(&ctx, None, "Docs").await.unwrap();
        state.folders.create_folder(&ctx, Some(docs.id.clone()), "Drafts").await.unwrap();
        let file = state
            .uploads
            .upload(&ctx, Some(docs.id.clone()), "notes.md", Bytes::from_static(b"# notes"), None, &cancel)
            .await
            .unwrap();
        (docs, file)
    };

    let state = AppState::from_config(disk_config(&dir)).await.unwrap();
    let listing = state.folders.list_children(&ctx, Some(&docs.id)).await.unwrap();
    assert_eq!(listing.folders.len(), 1);
    assert_eq!(listing.folders[0].name, "Drafts");
    assert_eq!(listing.files.len(), 1);
    assert_eq!(listing.files[0].id, file.id);

    let (_, data) = state.files.download(&ctx, &file.id).await.unwrap();
    assert_eq!(data, Bytes::from_static(b"# notes"));
}

#[tokio::test]
async fn test_rename_and_cascade_delete_on_disk() {
    let dir = TempDir::new().unwrap();
    let state = AppState::from_config(disk_config(&dir)).await.unwrap();
    let ctx = alice();
    let cancel = CancellationToken::new();

    let docs = state.folders.create_folder(&ctx, None, "Docs").await.unwrap();
    let inner = state.folders.create_folder(&ctx, Some(docs.id.clone()), "Inner").await.unwrap();
    state
        .uploads
        .upload(&ctx, Some(inner.id.clone()), "a.bin", Bytes::from_static(b"a"), None, &cancel)
        .await
        .unwrap();

    let renamed = state.folders.rename_folder(&ctx, &docs.id, "Papers").await.unwrap();
    assert_eq!(renamed.name, "Papers");
    let root = state.folders.list_children(&ctx, None).await.unwrap();
    assert_eq!(root.folders[0].name, "Papers");

    state.folders.delete_folder(&ctx, &docs.id, &cancel).await.unwrap();
    assert!(state.folders.list_children(&ctx, None).await.unwrap().is_empty());
    assert!(state.objects.list("").await.unwrap().is_empty());
    assert!(state.folders.tree(&ctx).await.unwrap().roots.is_empty());
}

#[tokio::test]
async fn test_owners_do_not_share_rows() {
    let dir = TempDir::new().unwrap();
    let state = AppState::from_config(disk_config(&dir)).await.unwrap();
    let alice = alice();
    let bob = SessionContext::new(OwnerId::parse("bob").unwrap());

    let folder = state.folders.create_folder(&alice, None, "Private").await.unwrap();
    assert!(state.folders.list_children(&bob, None).await.unwrap().is_empty());
    assert!(state.folders.get_folder(&bob, &folder.id).await.is_err());
}
