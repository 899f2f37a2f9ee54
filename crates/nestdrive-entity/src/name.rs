//! Folder and file name rules.

use nestdrive_core::error::AppError;

/// Longest accepted name, in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate a user-supplied folder or file name.
///
/// Names are plain strings and need not be unique among siblings. They must
/// not be blank and must not contain `/` or NUL, because a file name becomes
/// the final segment of its object path.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "Name exceeds {MAX_NAME_LENGTH} bytes"
        )));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(AppError::validation("Name cannot contain '/' or NUL"));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("Name cannot be '.' or '..'"));
    }
    Ok(())
}
