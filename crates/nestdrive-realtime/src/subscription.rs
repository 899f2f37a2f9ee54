//! Client-side handle of a live scope query.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use nestdrive_core::types::Scope;
use nestdrive_entity::Snapshot;

use crate::channel::{ChannelRegistry, SnapshotCell, SubscriptionId};

/// A live query on one scope.
///
/// The first [`next`](Self::next) yields the initial snapshot; every later
/// call waits for the next published snapshot. Snapshots published while
/// the holder is not waiting are coalesced into the most recent one.
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct LiveSubscription {
    id: SubscriptionId,
    scope: Scope,
    receiver: watch::Receiver<SnapshotCell>,
    pending: Option<Arc<Snapshot>>,
    cancel: CancellationToken,
    registry: Arc<ChannelRegistry>,
    closed: bool,
}

impl LiveSubscription {
    pub(crate) fn new(
        id: SubscriptionId,
        scope: Scope,
        receiver: watch::Receiver<SnapshotCell>,
        initial: Arc<Snapshot>,
        cancel: CancellationToken,
        registry: Arc<ChannelRegistry>,
    ) -> Self {
        Self {
            id,
            scope,
            receiver,
            pending: Some(initial),
            cancel,
            registry,
            closed: false,
        }
    }

    /// Subscription id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The scope being watched.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether the subscription has been cancelled or closed.
    pub fn is_closed(&self) -> bool {
        self.closed || self.cancel.is_cancelled()
    }

    /// Wait for the next snapshot. Returns `None` once the subscription is
    /// cancelled, either directly or because its owner's session ended.
    pub async fn next(&mut self) -> Option<Arc<Snapshot>> {
        if self.is_closed() {
            self.close();
            return None;
        }
        if let Some(initial) = self.pending.take() {
            return Some(initial);
        }

        let changed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.receiver.changed() => result.is_ok(),
        };
        if !changed {
            self.close();
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }

    /// Stop receiving snapshots and release the channel slot.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.close();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.pending = None;
            self.registry.unsubscribe(&self.scope.owner_id, self.id);
            debug!(subscription_id = %self.id, scope = %self.scope, "Live subscription closed");
        }
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.close();
    }
}
