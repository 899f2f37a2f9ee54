//! Domain events emitted by namespace operations.
//!
//! Events are handed to [`NamespaceObserver`](crate::traits::NamespaceObserver)
//! implementations after the corresponding write has been committed.

pub mod namespace;

pub use namespace::{NamespaceEvent, NamespaceEventKind};
