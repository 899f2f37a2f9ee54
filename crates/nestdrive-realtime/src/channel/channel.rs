//! A single scope channel with its subscribers.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use nestdrive_core::types::Scope;
use nestdrive_entity::Snapshot;

use super::subscription::SubscriptionId;

/// Latest snapshot published on a channel (`None` until the first publish).
pub type SnapshotCell = Option<Arc<Snapshot>>;

/// Everything needed to publish on a channel without holding the registry.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    /// Sender side of the snapshot cell.
    pub sender: Arc<watch::Sender<SnapshotCell>>,
    /// Serializes query-and-publish cycles for the scope.
    pub publish_lock: Arc<Mutex<()>>,
}

/// A scope channel: one watch cell shared by every subscriber of the scope.
#[derive(Debug)]
pub struct ScopeChannel {
    /// The scope this channel serves.
    pub scope: Scope,
    /// Subscribed ids.
    subscribers: HashSet<SubscriptionId>,
    handle: ChannelHandle,
}

impl ScopeChannel {
    /// Creates a new empty channel.
    pub fn new(scope: Scope) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            scope,
            subscribers: HashSet::new(),
            handle: ChannelHandle {
                sender: Arc::new(sender),
                publish_lock: Arc::new(Mutex::new(())),
            },
        }
    }

    /// Adds a subscriber and returns its receiver.
    pub fn subscribe(&mut self, id: SubscriptionId) -> watch::Receiver<SnapshotCell> {
        self.subscribers.insert(id);
        self.handle.sender.subscribe()
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.remove(&id);
    }

    /// Publishing handle.
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    /// Returns subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns whether the channel has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
