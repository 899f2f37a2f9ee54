//! Client-side views over a live scope.

pub mod cache;
pub mod folder_view;

pub use cache::{OpId, PendingChange, ViewCache};
pub use folder_view::FolderView;
