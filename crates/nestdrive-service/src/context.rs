//! The acting session, passed explicitly into every service call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nestdrive_core::types::{OwnerId, Session};

/// Context for the current signed-in user.
///
/// Every record a service writes is owned by `owner_id`, and every read is
/// filtered by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The acting owner.
    pub owner_id: OwnerId,
    /// Email of the signed-in account, when known.
    pub email: Option<String>,
    /// When the context was created.
    pub request_time: DateTime<Utc>,
}

impl SessionContext {
    /// Context for an owner without session details (workers, tests).
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            email: None,
            request_time: Utc::now(),
        }
    }
}

impl From<&Session> for SessionContext {
    fn from(session: &Session) -> Self {
        Self {
            owner_id: session.uid.clone(),
            email: Some(session.email.clone()),
            request_time: Utc::now(),
        }
    }
}
