//! File services.

pub mod service;
pub mod upload;

pub use service::FileService;
pub use upload::{BatchItem, BatchOutcome, BatchProgressCallback, UploadService};
