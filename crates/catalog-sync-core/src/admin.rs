use crate::fallback::{load_bucket, save_bucket, FallbackStore, StoreError};
use catalog_sync_models::AdminSession;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Fallback store bucket holding the signed-in admin session
pub const SESSION_BUCKET: &str = "admin_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid admin credentials")]
    InvalidCredentials,

    #[error("No admin password configured")]
    NotConfigured,

    #[error("Failed to persist admin session: {0}")]
    Store(#[from] StoreError),
}

/// Admin console sign-in.
///
/// Credentials are compared against the configured username and password.
/// The session survives restarts through the fallback store. The most
/// recent failure is kept in an advisory error field.
pub struct AdminAuth {
    store: Arc<dyn FallbackStore>,
    username: String,
    password: Option<String>,
    session: Option<AdminSession>,
    error: Option<String>,
}

impl AdminAuth {
    pub fn new(store: Arc<dyn FallbackStore>, username: &str, password: Option<String>) -> Self {
        Self {
            store,
            username: username.to_string(),
            password,
            session: None,
            error: None,
        }
    }

    /// Pick up a session saved by an earlier run.
    pub fn restore(&mut self) -> Option<&AdminSession> {
        self.session = load_bucket::<AdminSession>(self.store.as_ref(), SESSION_BUCKET)
            .filter(|session| session.username == self.username);
        if let Some(ref session) = self.session {
            info!("Restored admin session for {}", session.username);
        }
        self.session.as_ref()
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<&AdminSession, AuthError> {
        self.error = None;

        let result = match self.password.as_deref() {
            None => Err(AuthError::NotConfigured),
            Some(expected) if username == self.username && password == expected => {
                let session = AdminSession::administrator(username);
                save_bucket(self.store.as_ref(), SESSION_BUCKET, &session)
                    .map(|_| session)
                    .map_err(AuthError::from)
            }
            Some(_) => Err(AuthError::InvalidCredentials),
        };

        match result {
            Ok(session) => {
                info!("Admin {} signed in", session.username);
                Ok(&*self.session.insert(session))
            }
            Err(e) => {
                warn!("Admin sign-in failed: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.session = None;
        self.error = None;
        self.store.remove(SESSION_BUCKET)?;
        info!("Admin signed out");
        Ok(())
    }

    pub fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
