//! # nestdrive-auth
//!
//! The bundled identity provider: email/password accounts hashed with
//! Argon2id, a single current session, and a change stream other
//! components follow to tear down per-user state.

pub mod password;
pub mod provider;

pub use password::{CredentialValidator, PasswordHasher};
pub use provider::LocalIdentityProvider;
