//! # nestdrive-entity
//!
//! Domain models for NestDrive. Folders and files are explicit, versioned
//! records (see [`record::NamespaceRecord`]) that are validated whenever
//! they cross the store boundary. The folder hierarchy is an adjacency list:
//! every record points at its parent and nothing stores a path.

pub mod file;
pub mod folder;
pub mod name;
pub mod record;
pub mod snapshot;

pub use file::{File, Locator};
pub use folder::{Folder, FolderNode, FolderTree};
pub use record::{NamespaceRecord, SCHEMA_VERSION};
pub use snapshot::{Listing, Snapshot};
