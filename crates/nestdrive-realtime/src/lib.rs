//! # nestdrive-realtime
//!
//! Live queries over namespace scopes. A subscriber names a scope
//! `(owner, parent)` and receives a full snapshot of its children, then a
//! fresh snapshot after every committed change to that scope.

pub mod bridge;
pub mod channel;
pub mod engine;
pub mod subscription;

pub use bridge::EventBridge;
pub use channel::{ChannelRegistry, SubscriptionId};
pub use engine::LiveQueryEngine;
pub use subscription::LiveSubscription;
