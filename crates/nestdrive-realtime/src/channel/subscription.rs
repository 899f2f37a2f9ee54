//! Subscription ids and the per-owner reverse index.

use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use uuid::Uuid;

use nestdrive_core::error::AppError;
use nestdrive_core::types::OwnerId;

/// Identifier of one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks which subscriptions each owner holds (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Owner → subscription id → channel name.
    by_owner: DashMap<OwnerId, HashMap<SubscriptionId, String>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription unless the owner already holds `limit`.
    pub fn add(
        &self,
        owner: &OwnerId,
        id: SubscriptionId,
        channel: String,
        limit: usize,
    ) -> Result<(), AppError> {
        let mut entry = self.by_owner.entry(owner.clone()).or_default();
        if entry.len() >= limit {
            return Err(AppError::limit_exceeded(format!(
                "At most {limit} live subscriptions are allowed per user"
            )));
        }
        entry.insert(id, channel);
        Ok(())
    }

    /// Removes a subscription, returning its channel name.
    pub fn remove(&self, owner: &OwnerId, id: SubscriptionId) -> Option<String> {
        let channel = self
            .by_owner
            .get_mut(owner)
            .and_then(|mut subs| subs.remove(&id));
        self.by_owner.remove_if(owner, |_, subs| subs.is_empty());
        channel
    }

    /// Returns the number of subscriptions an owner holds.
    pub fn count(&self, owner: &OwnerId) -> usize {
        self.by_owner.get(owner).map(|subs| subs.len()).unwrap_or(0)
    }

    /// Removes all subscriptions of an owner.
    pub fn remove_all(&self, owner: &OwnerId) -> HashMap<SubscriptionId, String> {
        self.by_owner
            .remove(owner)
            .map(|(_, subs)| subs)
            .unwrap_or_default()
    }
}
