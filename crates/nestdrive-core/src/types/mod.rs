//! Core type definitions used across the NestDrive workspace.

pub mod id;
pub mod scope;
pub mod session;

pub use id::{FileId, FolderId, OwnerId};
pub use scope::Scope;
pub use session::Session;
