//! Observer hook for committed namespace mutations.

use async_trait::async_trait;

use crate::events::NamespaceEvent;

/// Receives every namespace mutation after it has been committed to the
/// metadata store.
///
/// The live query engine implements this to push fresh snapshots; the
/// service layer calls it and never reads anything back, so observers cannot
/// feed into the mutation that triggered them.
#[async_trait]
pub trait NamespaceObserver: Send + Sync + std::fmt::Debug + 'static {
    /// Handle a committed event.
    async fn on_event(&self, event: &NamespaceEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl NamespaceObserver for NoopObserver {
    async fn on_event(&self, _event: &NamespaceEvent) {}
}
