//! # nestdrive-core
//!
//! Core crate for NestDrive. Contains the object-store and observer traits,
//! configuration schemas, typed identifiers (including the identifier
//! generator), namespace events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other NestDrive crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
