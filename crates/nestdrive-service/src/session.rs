//! Binds live subscriptions to the identity provider's session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::IdentityProvider;
use nestdrive_core::types::Session;
use nestdrive_realtime::LiveQueryEngine;

use crate::context::SessionContext;

/// Tracks the signed-in session and tears down the previous owner's live
/// subscriptions whenever the session changes.
///
/// Sessions are compared as whole values, so signing out and back in as
/// the same user still closes the old subscriptions.
#[derive(Debug)]
pub struct SessionScope {
    provider: Arc<dyn IdentityProvider>,
    engine: Arc<LiveQueryEngine>,
    watcher: JoinHandle<()>,
}

impl SessionScope {
    /// Start following `provider`'s session changes.
    pub fn spawn(provider: Arc<dyn IdentityProvider>, engine: Arc<LiveQueryEngine>) -> Self {
        let mut changes = provider.on_session_change();
        let watch_engine = engine.clone();
        let watcher = tokio::spawn(async move {
            let mut current = changes.borrow_and_update().clone();
            while changes.changed().await.is_ok() {
                let next = changes.borrow_and_update().clone();
                if next == current {
                    continue;
                }
                if let Some(previous) = &current {
                    debug!(owner_id = %previous.uid, "Session changed; closing live queries");
                    watch_engine.cancel_owner(&previous.uid);
                }
                current = next;
            }
        });

        Self {
            provider,
            engine,
            watcher,
        }
    }

    /// The identity provider.
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// The current session, if signed in.
    pub fn session(&self) -> Option<Session> {
        self.provider.current_session()
    }

    /// Context for service calls on behalf of the signed-in user.
    pub fn context(&self) -> AppResult<SessionContext> {
        self.session()
            .map(|session| SessionContext::from(&session))
            .ok_or_else(|| AppError::authentication("Not signed in"))
    }

    /// Sign in, closing any live queries of the previous session first.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        self.end_current();
        let session = self.provider.sign_in(email, password).await?;
        info!(owner_id = %session.uid, "Signed in");
        Ok(SessionContext::from(&session))
    }

    /// Create an account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        self.end_current();
        let session = self.provider.sign_up(email, password).await?;
        info!(owner_id = %session.uid, "Signed up");
        Ok(SessionContext::from(&session))
    }

    /// Sign out and close the session's live queries.
    pub async fn sign_out(&self) -> AppResult<()> {
        let previous = self.provider.current_session();
        self.provider.sign_out().await?;
        if let Some(previous) = previous {
            self.engine.cancel_owner(&previous.uid);
            info!(owner_id = %previous.uid, "Signed out");
        }
        Ok(())
    }

    fn end_current(&self) {
        if let Some(previous) = self.provider.current_session() {
            self.engine.cancel_owner(&previous.uid);
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
