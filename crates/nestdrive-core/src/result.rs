//! Convenience result type alias for NestDrive.

use crate::error::AppError;

/// A specialized `Result` type for NestDrive operations.
pub type AppResult<T> = Result<T, AppError>;
