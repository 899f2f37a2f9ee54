//! Channel registry: every live scope channel and its subscriptions.

use dashmap::DashMap;
use tokio::sync::watch;

use nestdrive_core::error::AppError;
use nestdrive_core::types::{OwnerId, Scope};

use super::channel::{ChannelHandle, ScopeChannel, SnapshotCell};
use super::subscription::{SubscriptionId, SubscriptionTracker};

/// Registry of all active scope channels.
///
/// A channel exists exactly while it has at least one subscriber.
#[derive(Debug)]
pub struct ChannelRegistry {
    /// Channel name → channel.
    channels: DashMap<String, ScopeChannel>,
    /// Owner → subscriptions (reverse index).
    subscriptions: SubscriptionTracker,
    /// Per-owner subscription cap.
    max_per_owner: usize,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new(max_per_owner: usize) -> Self {
        Self {
            channels: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
            max_per_owner,
        }
    }

    /// Subscribes to a scope's channel, creating it if needed.
    pub fn subscribe(
        &self,
        scope: &Scope,
        id: SubscriptionId,
    ) -> Result<(watch::Receiver<SnapshotCell>, ChannelHandle), AppError> {
        let name = scope.channel_name();
        self.subscriptions
            .add(&scope.owner_id, id, name.clone(), self.max_per_owner)?;

        let mut channel = self
            .channels
            .entry(name)
            .or_insert_with(|| ScopeChannel::new(scope.clone()));
        let receiver = channel.subscribe(id);
        Ok((receiver, channel.handle()))
    }

    /// Unsubscribes one subscription, dropping the channel once empty.
    pub fn unsubscribe(&self, owner: &OwnerId, id: SubscriptionId) {
        if let Some(name) = self.subscriptions.remove(owner, id) {
            self.detach(&name, id);
        }
    }

    /// Unsubscribes every subscription of an owner. Returns how many were
    /// removed.
    pub fn unsubscribe_owner(&self, owner: &OwnerId) -> usize {
        let subs = self.subscriptions.remove_all(owner);
        for (id, name) in &subs {
            self.detach(name, *id);
        }
        subs.len()
    }

    fn detach(&self, name: &str, id: SubscriptionId) {
        if let Some(mut channel) = self.channels.get_mut(name) {
            channel.unsubscribe(id);
        }
        self.channels.remove_if(name, |_, channel| channel.is_empty());
    }

    /// Publishing handle for a scope, if anyone is subscribed to it.
    pub fn handle(&self, scope: &Scope) -> Option<ChannelHandle> {
        self.channels
            .get(&scope.channel_name())
            .filter(|channel| !channel.is_empty())
            .map(|channel| channel.handle())
    }

    /// Returns the subscription count for an owner.
    pub fn owner_subscription_count(&self, owner: &OwnerId) -> usize {
        self.subscriptions.count(owner)
    }

    /// Returns subscriber count for a scope.
    pub fn subscriber_count(&self, scope: &Scope) -> usize {
        self.channels
            .get(&scope.channel_name())
            .map(|channel| channel.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of active channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
