//! # nestdrive-service
//!
//! Application services for NestDrive. Each service coordinates the
//! namespace store, the object store and the live query engine for one
//! family of use cases, always on behalf of an explicit [`SessionContext`].
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod file;
pub mod folder;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod view;

pub use context::SessionContext;
pub use file::{BatchItem, BatchOutcome, FileService, UploadService};
pub use folder::FolderService;
pub use reconcile::{ReconcileReport, Reconciler};
pub use session::SessionScope;
pub use state::AppState;
pub use view::{FolderView, ViewCache};
