//! Live queries, session scoping, and optimistic views.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use nestdrive_auth::LocalIdentityProvider;
use nestdrive_core::config::AuthConfig;
use nestdrive_entity::Locator;
use nestdrive_service::{FolderView, SessionScope};

use crate::helpers::{TestApp, within};

#[tokio::test]
async fn test_new_file_reaches_open_subscription() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let f1 = app.state.folders.create_folder(&u1, None, "Docs").await.unwrap();

    let mut live = app
        .state
        .engine
        .subscribe(&u1.owner_id, Some(f1.id.clone()))
        .await
        .unwrap();
    let initial = within(live.next()).await.unwrap();
    assert!(initial.listing.is_empty());

    let file = app
        .state
        .files
        .create_file(
            &u1,
            Some(f1.id.clone()),
            "a.txt",
            Locator::new("u1/f1/a.txt", "http://localhost/objects/u1/f1/a.txt"),
            12,
            None,
        )
        .await
        .unwrap();

    let next = within(live.next()).await.unwrap();
    assert!(next.sequence > initial.sequence);
    assert_eq!(next.listing.files.len(), 1);
    assert_eq!(next.listing.files[0].id, file.id);
}

#[tokio::test]
async fn test_fresh_subscription_includes_committed_file() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let f1 = app.state.folders.create_folder(&u1, None, "Docs").await.unwrap();
    app.state
        .files
        .create_file(&u1, Some(f1.id.clone()), "a.txt", Locator::new("u1/f1/a.txt", "u"), 12, None)
        .await
        .unwrap();

    let mut live = app.state.engine.subscribe(&u1.owner_id, Some(f1.id)).await.unwrap();
    let snapshot = within(live.next()).await.unwrap();
    assert_eq!(snapshot.listing.files.len(), 1);
}

#[tokio::test]
async fn test_other_owners_changes_are_not_delivered() {
    let app = TestApp::new();
    let alice = app.ctx("alice");
    let bob = app.ctx("bob");

    let mut live = app.state.engine.subscribe(&alice.owner_id, None).await.unwrap();
    within(live.next()).await.unwrap();

    app.state.folders.create_folder(&bob, None, "Bob's").await.unwrap();
    app.state.folders.create_folder(&alice, None, "Alice's").await.unwrap();

    let snapshot = within(live.next()).await.unwrap();
    assert_eq!(snapshot.listing.folders.len(), 1);
    assert_eq!(snapshot.listing.folders[0].name, "Alice's");
}

#[tokio::test]
async fn test_cancelled_subscription_ends() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let mut live = app.state.engine.subscribe(&u1.owner_id, None).await.unwrap();
    within(live.next()).await.unwrap();

    live.cancel();
    assert!(within(live.next()).await.is_none());
    assert_eq!(app.state.engine.registry().owner_subscription_count(&u1.owner_id), 0);

    // Later commits still succeed with nobody listening.
    app.state.folders.create_folder(&u1, None, "after").await.unwrap();
}

#[tokio::test]
async fn test_session_change_cancels_subscriptions() {
    let app = TestApp::new();
    let provider = Arc::new(LocalIdentityProvider::in_memory(&AuthConfig::default()));
    let session = SessionScope::spawn(provider, app.state.engine.clone());

    let ctx = session.sign_up("one@example.com", "secret1").await.unwrap();
    let mut live = app.state.engine.subscribe(&ctx.owner_id, None).await.unwrap();
    within(live.next()).await.unwrap();

    session.sign_up("two@example.com", "secret2").await.unwrap();
    assert!(within(live.next()).await.is_none());
    assert_ne!(session.context().unwrap().owner_id, ctx.owner_id);
}

#[tokio::test]
async fn test_view_rolls_back_failed_delete() {
    let app = TestApp::new();
    let u1 = app.ctx("u1");
    let cancel = CancellationToken::new();
    let file = app
        .state
        .uploads
        .upload(&u1, None, "keep.txt", Bytes::from_static(b"k"), None, &cancel)
        .await
        .unwrap();

    let view = FolderView::open(app.state.clone(), u1.clone(), None).await.unwrap();
    assert_eq!(view.listing().files.len(), 1);

    app.objects.fail_deletes.store(true, Ordering::SeqCst);
    assert!(view.delete_file(&file.id, &cancel).await.is_err());

    let listing = view.listing();
    assert_eq!(listing.files.len(), 1);
    assert_eq!(listing.files[0].id, file.id);
    assert_eq!(
        view.last_error().as_deref(),
        Some("Something went wrong. Please try again.")
    );
}
