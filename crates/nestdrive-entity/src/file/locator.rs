//! Object store locators.

use serde::{Deserialize, Serialize};

/// Where a file's bytes live: the object path inside the store plus the URL
/// the object can be retrieved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Path within the object store.
    pub path: String,
    /// Publicly resolvable retrieval URL.
    pub url: String,
}

impl Locator {
    /// Create a locator.
    pub fn new(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}
