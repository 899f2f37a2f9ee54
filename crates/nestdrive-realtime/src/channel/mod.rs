//! Per-scope snapshot channels.

pub mod channel;
pub mod registry;
pub mod subscription;

pub use channel::{ChannelHandle, ScopeChannel, SnapshotCell};
pub use registry::ChannelRegistry;
pub use subscription::{SubscriptionId, SubscriptionTracker};
