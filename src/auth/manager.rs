//! Server-side session management.

use super::{AuthError, AuthFailure, Authenticator, CredentialHasher};
use crate::config::AuthConfig;
use crate::session::{SessionStore, ValidateError};
use std::time::Duration;
use tracing::debug;

/// Facade over the session table and the password hasher. Owns all session
/// state for the lifetime of the service.
pub struct SessionManager {
    store: SessionStore,
    hasher: CredentialHasher,
}

impl SessionManager {
    pub fn new(session_duration: Duration, hasher: CredentialHasher) -> Self {
        Self::with_store(SessionStore::new(session_duration), hasher)
    }

    /// Build around an existing store, e.g. one driven by a manual clock.
    pub fn with_store(store: SessionStore, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.session_duration(),
            CredentialHasher::new(config.pbkdf2_iterations, config.pbkdf2_key_length),
        )
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }
}

impl Authenticator for SessionManager {
    fn create_session(&self) -> Result<String, AuthError> {
        Ok(self.store.create_session()?)
    }

    fn validate_session(&self, token: &str) -> Result<(), AuthError> {
        self.store.validate(token).map_err(|e| {
            let failure = match e {
                ValidateError::NotFound => AuthFailure::UnknownToken,
                ValidateError::Expired => AuthFailure::Expired,
            };
            debug!("Session rejected: {} token", failure.as_str());
            AuthError::Authentication(failure)
        })
    }

    fn end_session(&self, token: &str) {
        if self.store.remove(token) {
            debug!("Session ended");
        }
    }

    fn hash_password(&self, password: &str, salt: &str) -> String {
        self.hasher.hash(password, salt)
    }

    fn sweep_expired(&self) -> usize {
        self.store.cleanup_expired()
    }
}
