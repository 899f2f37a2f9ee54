//! Fan-out of committed namespace events to several observers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use nestdrive_core::events::NamespaceEvent;
use nestdrive_core::traits::NamespaceObserver;

/// Forwards every event to each registered observer, in registration order.
#[derive(Debug, Default)]
pub struct EventBridge {
    observers: Vec<Arc<dyn NamespaceObserver>>,
}

impl EventBridge {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn with(mut self, observer: Arc<dyn NamespaceObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[async_trait]
impl NamespaceObserver for EventBridge {
    async fn on_event(&self, event: &NamespaceEvent) {
        debug!(event_id = %event.id, owner_id = %event.owner_id, "Dispatching namespace event");
        for observer in &self.observers {
            observer.on_event(event).await;
        }
    }
}
