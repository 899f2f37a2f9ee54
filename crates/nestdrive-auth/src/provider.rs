//! Local email/password identity provider.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use nestdrive_core::config::AuthConfig;
use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::traits::IdentityProvider;
use nestdrive_core::types::{OwnerId, Session, id};

use crate::password::{CredentialValidator, PasswordHasher};

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    uid: OwnerId,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

/// Everything the provider persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IdentityState {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    session: Option<Session>,
}

/// Identity provider keeping accounts in a JSON file (or only in memory).
///
/// There is one current session at a time; every sign-in, sign-up and
/// sign-out is published on the session change stream.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    state_path: Option<PathBuf>,
    state: Mutex<IdentityState>,
    hasher: PasswordHasher,
    validator: CredentialValidator,
    session_tx: watch::Sender<Option<Session>>,
}

impl LocalIdentityProvider {
    /// Open the provider backed by `config.state_path`, restoring any
    /// persisted accounts and session.
    pub async fn open(config: &AuthConfig) -> AppResult<Self> {
        let path = PathBuf::from(&config.state_path);
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<IdentityState>(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IdentityState::default(),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read identity state: {}", path.display()),
                    e,
                ));
            }
        };
        Ok(Self::with_state(Some(path), state, config))
    }

    /// Create a provider that keeps everything in memory.
    pub fn in_memory(config: &AuthConfig) -> Self {
        Self::with_state(None, IdentityState::default(), config)
    }

    fn with_state(state_path: Option<PathBuf>, state: IdentityState, config: &AuthConfig) -> Self {
        let (session_tx, _) = watch::channel(state.session.clone());
        Self {
            state_path,
            state: Mutex::new(state),
            hasher: PasswordHasher::new(),
            validator: CredentialValidator::new(config),
            session_tx,
        }
    }

    async fn persist(&self, state: &IdentityState) -> AppResult<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Record the new session, persist, then publish it.
    async fn switch_session(
        &self,
        state: &mut IdentityState,
        session: Option<Session>,
    ) -> AppResult<()> {
        state.session = session.clone();
        self.persist(state).await?;
        self.session_tx.send_replace(session);
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        self.validator.validate(&email, password)?;

        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.iter().find(|a| a.email == email).cloned() else {
            warn!(email = %email, "Sign-in for unknown account");
            return Err(AppError::authentication("Invalid email or password"));
        };
        if !self.hasher.verify_password(password, &account.password_hash)? {
            warn!(uid = %account.uid, "Sign-in with wrong password");
            return Err(AppError::authentication("Invalid email or password"));
        }

        let session = Session::new(account.uid.clone(), account.email.clone());
        self.switch_session(&mut state, Some(session.clone())).await?;
        info!(uid = %session.uid, "Signed in");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        self.validator.validate_new(&email, password)?;

        let mut state = self.state.lock().await;
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(AppError::conflict("An account with this email already exists"));
        }

        let account = Account {
            uid: OwnerId::parse(id::generate())?,
            email: email.clone(),
            password_hash: self.hasher.hash_password(password)?,
            created_at: Utc::now(),
        };
        let session = Session::new(account.uid.clone(), email);
        state.accounts.push(account);
        self.switch_session(&mut state, Some(session.clone())).await?;
        info!(uid = %session.uid, "Account created");
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.session.clone() {
            self.switch_session(&mut state, None).await?;
            info!(uid = %previous.uid, "Signed out");
        }
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    fn on_session_change(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::in_memory(&AuthConfig::default())
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = provider();
        let created = provider.sign_up("Ann@Example.com ", "secret1").await.expect("sign up");
        assert_eq!(created.email, "ann@example.com");
        provider.sign_out().await.expect("sign out");
        assert!(provider.current_session().is_none());

        let session = provider.sign_in("ann@example.com", "secret1").await.expect("sign in");
        assert_eq!(session.uid, created.uid);
        assert_eq!(provider.current_session().map(|s| s.uid), Some(created.uid));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_account() {
        let provider = provider();
        provider.sign_up("a@b.io", "secret1").await.expect("sign up");

        let err = provider.sign_in("a@b.io", "wrong!").await.expect_err("wrong");
        assert_eq!(err.kind, ErrorKind::Authentication);
        let err = provider.sign_in("z@b.io", "secret1").await.expect_err("unknown");
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_sign_up_validation_and_duplicates() {
        let provider = provider();
        let err = provider.sign_up("nope", "secret1").await.expect_err("email");
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = provider.sign_up("a@b.io", "123").await.expect_err("short");
        assert_eq!(err.kind, ErrorKind::Validation);

        provider.sign_up("a@b.io", "secret1").await.expect("sign up");
        let err = provider.sign_up("A@B.io", "secret2").await.expect_err("duplicate");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_change_stream_sees_every_transition() {
        let provider = provider();
        let mut rx = provider.on_session_change();
        assert!(rx.borrow().is_none());

        let session = provider.sign_up("a@b.io", "secret1").await.expect("sign up");
        rx.changed().await.expect("changed");
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| &s.uid), Some(&session.uid));

        provider.sign_out().await.expect("sign out");
        rx.changed().await.expect("changed");
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AuthConfig {
            state_path: dir.path().join("identity.json").to_string_lossy().into_owned(),
            ..AuthConfig::default()
        };

        let first = LocalIdentityProvider::open(&config).await.expect("open");
        let session = first.sign_up("a@b.io", "secret1").await.expect("sign up");

        let second = LocalIdentityProvider::open(&config).await.expect("reopen");
        assert_eq!(second.current_session().map(|s| s.uid), Some(session.uid));
        second.sign_out().await.expect("sign out");
        second.sign_in("a@b.io", "secret1").await.expect("sign in");
    }
}
