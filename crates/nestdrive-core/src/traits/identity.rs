//! Identity provider contract consumed by the namespace core.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::result::AppResult;
use crate::types::Session;

/// External identity provider.
///
/// The namespace core only needs the session's `uid`; everything about
/// credentials stays behind this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session>;

    /// End the current session, if any.
    async fn sign_out(&self) -> AppResult<()>;

    /// The current session, if signed in.
    fn current_session(&self) -> Option<Session>;

    /// Stream of session changes. The receiver starts at the current value
    /// and observes every later sign-in and sign-out.
    fn on_session_change(&self) -> watch::Receiver<Option<Session>>;
}
