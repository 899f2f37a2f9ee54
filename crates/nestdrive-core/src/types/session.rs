//! Authenticated session as issued by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::OwnerId;

/// An authenticated session. `uid` is the owner id for every namespace and
/// object store call made on behalf of this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user's id.
    pub uid: OwnerId,
    /// The email address used to sign in.
    pub email: String,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Create a session that starts now.
    pub fn new(uid: OwnerId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
            signed_in_at: Utc::now(),
        }
    }
}
