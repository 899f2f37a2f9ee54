//! Core traits defined in `nestdrive-core` and implemented by other crates.

pub mod identity;
pub mod observer;
pub mod storage;

pub use identity::IdentityProvider;
pub use observer::{NamespaceObserver, NoopObserver};
pub use storage::{ByteStream, ObjectMeta, ObjectStore};
