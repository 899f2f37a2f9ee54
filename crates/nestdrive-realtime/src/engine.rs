//! Live query engine: re-queries scopes after commits and publishes
//! snapshots to their subscribers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nestdrive_core::config::RealtimeConfig;
use nestdrive_core::events::NamespaceEvent;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::NamespaceObserver;
use nestdrive_core::types::{FolderId, OwnerId, Scope};
use nestdrive_database::NamespaceStore;
use nestdrive_entity::Snapshot;

use crate::channel::{ChannelHandle, ChannelRegistry, SnapshotCell, SubscriptionId};
use crate::subscription::LiveSubscription;

/// Pushes full scope snapshots to live subscribers.
///
/// Within a scope, query-and-publish cycles run one at a time and carry
/// increasing sequence numbers, so subscribers see snapshots in commit
/// order and always end up with the newest one.
#[derive(Debug)]
pub struct LiveQueryEngine {
    store: Arc<dyn NamespaceStore>,
    registry: Arc<ChannelRegistry>,
    /// Per-owner cancellation, fired on session change.
    owner_tokens: DashMap<OwnerId, CancellationToken>,
    /// Source of snapshot sequence numbers. Shared across scopes so a scope
    /// that is dropped and re-subscribed never goes backwards.
    sequence: AtomicU64,
}

impl LiveQueryEngine {
    /// Create an engine reading from `store`.
    pub fn new(store: Arc<dyn NamespaceStore>, config: &RealtimeConfig) -> Self {
        Self {
            store,
            registry: Arc::new(ChannelRegistry::new(config.max_subscriptions_per_owner)),
            owner_tokens: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// The channel registry.
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Subscribe to the children of `parent_id` (`None` for the root) in
    /// `owner`'s namespace.
    pub async fn subscribe(
        &self,
        owner: &OwnerId,
        parent_id: Option<FolderId>,
    ) -> AppResult<LiveSubscription> {
        let scope = Scope::new(owner.clone(), parent_id);
        let id = SubscriptionId::new();
        // Taken before the initial query: a cancel_owner landing during it
        // must still close this subscription.
        let cancel = self
            .owner_tokens
            .entry(owner.clone())
            .or_default()
            .child_token();
        let (mut receiver, handle) = self.registry.subscribe(&scope, id)?;

        let initial = match self.publish_with(&scope, &handle, Some(&mut receiver)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.registry.unsubscribe(owner, id);
                return Err(e);
            }
        };

        info!(owner_id = %owner, scope = %scope, subscription_id = %id, "Live subscription opened");
        Ok(LiveSubscription::new(
            id,
            scope,
            receiver,
            initial,
            cancel,
            self.registry.clone(),
        ))
    }

    /// Close every live subscription of `owner`.
    pub fn cancel_owner(&self, owner: &OwnerId) {
        if let Some((_, token)) = self.owner_tokens.remove(owner) {
            token.cancel();
        }
        let removed = self.registry.unsubscribe_owner(owner);
        info!(owner_id = %owner, removed, "Cancelled live subscriptions");
    }

    /// Re-query a scope and publish the result, if it has subscribers.
    pub async fn refresh(&self, scope: &Scope) -> AppResult<()> {
        match self.registry.handle(scope) {
            Some(handle) => self.publish_with(scope, &handle, None).await.map(|_| ()),
            None => {
                debug!(scope = %scope, "No subscribers; skipping refresh");
                Ok(())
            }
        }
    }

    /// Query and publish under the scope's lock. A receiver passed as
    /// `seen` is marked as having observed this snapshot, since its holder
    /// gets it as the initial value.
    async fn publish_with(
        &self,
        scope: &Scope,
        handle: &ChannelHandle,
        seen: Option<&mut watch::Receiver<SnapshotCell>>,
    ) -> AppResult<Arc<Snapshot>> {
        let _guard = handle.publish_lock.lock().await;
        let listing = self.store.list_scope(scope).await?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Snapshot::new(scope.clone(), sequence, listing);
        handle.sender.send_replace(Some(snapshot.clone()));
        if let Some(receiver) = seen {
            receiver.borrow_and_update();
        }
        debug!(scope = %scope, sequence, entries = snapshot.listing.len(), "Published snapshot");
        Ok(snapshot)
    }
}

#[async_trait]
impl NamespaceObserver for LiveQueryEngine {
    async fn on_event(&self, event: &NamespaceEvent) {
        for scope in event.affected_scopes() {
            if let Err(e) = self.refresh(&scope).await {
                warn!(scope = %scope, event_id = %event.id, error = %e, "Failed to refresh scope");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Notify;

    use nestdrive_core::events::NamespaceEventKind;
    use nestdrive_core::types::FileId;
    use nestdrive_database::MemoryNamespaceStore;
    use nestdrive_entity::{File, Folder, Listing};

    use super::*;

    fn owner(s: &str) -> OwnerId {
        OwnerId::parse(s).expect("owner")
    }

    fn engine(store: Arc<MemoryNamespaceStore>) -> LiveQueryEngine {
        LiveQueryEngine::new(store, &RealtimeConfig::default())
    }

    async fn add_folder(store: &MemoryNamespaceStore, engine: &LiveQueryEngine, u: &OwnerId, name: &str) {
        let folder = Folder::new(FolderId::generate(), u.clone(), None, name).expect("folder");
        store.insert_folder(&folder).await.expect("insert");
        engine
            .on_event(&NamespaceEvent::new(
                u.clone(),
                NamespaceEventKind::FolderCreated {
                    folder_id: folder.id.clone(),
                    parent_id: None,
                    name: folder.name.clone(),
                },
            ))
            .await;
    }

    #[tokio::test]
    async fn test_initial_then_updates() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = engine(store.clone());
        let u1 = owner("u1");

        let mut sub = engine.subscribe(&u1, None).await.expect("subscribe");
        let initial = sub.next().await.expect("initial");
        assert!(initial.listing.is_empty());

        add_folder(&store, &engine, &u1, "Docs").await;
        let update = sub.next().await.expect("update");
        assert_eq!(update.listing.folders.len(), 1);
        assert!(update.sequence > initial.sequence);
    }

    #[tokio::test]
    async fn test_coalesces_to_latest() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = engine(store.clone());
        let u1 = owner("u1");

        let mut sub = engine.subscribe(&u1, None).await.expect("subscribe");
        sub.next().await.expect("initial");
        for name in ["a", "b", "c"] {
            add_folder(&store, &engine, &u1, name).await;
        }
        let latest = sub.next().await.expect("latest");
        assert_eq!(latest.listing.folders.len(), 3);
    }

    #[tokio::test]
    async fn test_other_owner_events_are_not_delivered() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = engine(store.clone());
        let (u1, u2) = (owner("u1"), owner("u2"));

        let mut sub = engine.subscribe(&u1, None).await.expect("subscribe");
        sub.next().await.expect("initial");
        add_folder(&store, &engine, &u2, "Theirs").await;

        let waited = tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery_and_frees_channel() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = engine(store.clone());
        let u1 = owner("u1");

        let mut sub = engine.subscribe(&u1, None).await.expect("subscribe");
        sub.next().await.expect("initial");
        sub.cancel();
        assert_eq!(engine.registry().channel_count(), 0);

        add_folder(&store, &engine, &u1, "Late").await;
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_owner_wakes_waiting_subscribers() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = Arc::new(engine(store));
        let u1 = owner("u1");

        let mut sub = engine.subscribe(&u1, None).await.expect("subscribe");
        sub.next().await.expect("initial");
        let waiter = tokio::spawn(async move { sub.next().await });

        tokio::task::yield_now().await;
        engine.cancel_owner(&u1);
        let result = waiter.await.expect("join");
        assert!(result.is_none());
        assert_eq!(engine.registry().owner_subscription_count(&u1), 0);
    }

    /// Store whose scope queries wait for a go-ahead.
    #[derive(Debug, Default)]
    struct GatedStore {
        inner: MemoryNamespaceStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl NamespaceStore for GatedStore {
        fn store_type(&self) -> &str {
            "gated"
        }
        async fn health_check(&self) -> AppResult<bool> {
            self.inner.health_check().await
        }
        async fn insert_folder(&self, folder: &Folder) -> AppResult<()> {
            self.inner.insert_folder(folder).await
        }
        async fn insert_file(&self, file: &File) -> AppResult<()> {
            self.inner.insert_file(file).await
        }
        async fn find_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<Option<Folder>> {
            self.inner.find_folder(owner, id).await
        }
        async fn find_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<Option<File>> {
            self.inner.find_file(owner, id).await
        }
        async fn list_folders(
            &self,
            owner: &OwnerId,
            parent: Option<&FolderId>,
        ) -> AppResult<Vec<Folder>> {
            self.inner.list_folders(owner, parent).await
        }
        async fn list_files(
            &self,
            owner: &OwnerId,
            folder: Option<&FolderId>,
        ) -> AppResult<Vec<File>> {
            self.inner.list_files(owner, folder).await
        }
        async fn list_all_folders(&self, owner: &OwnerId) -> AppResult<Vec<Folder>> {
            self.inner.list_all_folders(owner).await
        }
        async fn list_all_files(&self, owner: &OwnerId) -> AppResult<Vec<File>> {
            self.inner.list_all_files(owner).await
        }
        async fn list_owners(&self) -> AppResult<Vec<OwnerId>> {
            self.inner.list_owners().await
        }
        async fn update_folder(&self, folder: &Folder) -> AppResult<()> {
            self.inner.update_folder(folder).await
        }
        async fn update_file(&self, file: &File) -> AppResult<()> {
            self.inner.update_file(file).await
        }
        async fn delete_folder(&self, owner: &OwnerId, id: &FolderId) -> AppResult<bool> {
            self.inner.delete_folder(owner, id).await
        }
        async fn delete_file(&self, owner: &OwnerId, id: &FileId) -> AppResult<bool> {
            self.inner.delete_file(owner, id).await
        }
        async fn list_scope(&self, scope: &Scope) -> AppResult<Listing> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.list_scope(scope).await
        }
    }

    #[tokio::test]
    async fn test_cancel_owner_during_initial_query_closes_subscription() {
        let store = Arc::new(GatedStore::default());
        let engine = Arc::new(LiveQueryEngine::new(store.clone(), &RealtimeConfig::default()));
        let u1 = owner("u1");

        let opening = tokio::spawn({
            let engine = engine.clone();
            let u1 = u1.clone();
            async move { engine.subscribe(&u1, None).await }
        });

        store.entered.notified().await;
        engine.cancel_owner(&u1);
        store.release.notify_one();

        let mut sub = opening.await.expect("join").expect("subscribe");
        assert!(sub.next().await.is_none());
        assert_eq!(engine.registry().owner_subscription_count(&u1), 0);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let store = Arc::new(MemoryNamespaceStore::new());
        let engine = engine(store);
        let u1 = owner("u1");
        {
            let _sub = engine.subscribe(&u1, None).await.expect("subscribe");
            assert_eq!(engine.registry().channel_count(), 1);
        }
        assert_eq!(engine.registry().channel_count(), 0);
    }
}
