//! Identifier generation and the newtype wrappers for namespace ids.
//!
//! Folder and file ids are 16-character strings drawn uniformly from a
//! 36-symbol alphabet (lowercase ASCII letters and digits). Generation does
//! not check uniqueness; the store rejects duplicates and the service layer
//! retries with a fresh id.
//!
//! Owner ids come from the identity provider and are opaque, but since they
//! become the first segment of every object path they are restricted to
//! characters that are safe in a path segment.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Length of every generated identifier.
pub const ID_LENGTH: usize = 16;

/// Symbols generated identifiers are drawn from.
pub const ID_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a fresh identifier from the thread-local random source.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generate a fresh identifier from the given random source.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Check that a string has the shape of a generated identifier.
pub fn is_valid_id(s: &str) -> bool {
    s.len() == ID_LENGTH && s.bytes().all(|b| ID_ALPHABET.contains(&b))
}

/// Macro to define a newtype ID wrapper around a generated identifier.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new random identifier.
            pub fn generate() -> Self {
                Self(generate())
            }

            /// Create a new identifier from the given random source.
            pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
                Self(generate_with(rng))
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_valid_id(s) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(AppError::validation(format!(
                        concat!("Malformed ", $label, " id: '{}'"),
                        s
                    )))
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                if is_valid_id(&s) {
                    Ok(Self(s))
                } else {
                    Err(AppError::validation(format!(
                        concat!("Malformed ", $label, " id: '{}'"),
                        s
                    )))
                }
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a folder.
    FolderId, "folder"
);

define_id!(
    /// Unique identifier for a file.
    FileId, "file"
);

/// Identity of the user owning a namespace, as issued by the identity
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

/// Longest owner id accepted.
const MAX_OWNER_ID_LENGTH: usize = 128;

impl OwnerId {
    /// Parse and validate an owner id.
    pub fn parse(s: impl Into<String>) -> Result<Self, AppError> {
        let s = s.into();
        let safe = s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if s.is_empty() || s.len() > MAX_OWNER_ID_LENGTH || !safe {
            return Err(AppError::validation(format!("Malformed owner id: '{s}'")));
        }
        Ok(Self(s))
    }

    /// Return the owner id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OwnerId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> String {
        id.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
