//! Credential lookup: per-user salt and stored password hash.
//!
//! The authentication core never stores users itself. It asks a
//! [`CredentialStore`] for a user's salt, hashes the presented password with
//! it, then asks the store whether that hash matches.

use crate::auth::{hashes_match, AuthError, Authenticator};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during credential operations
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("unknown user")]
    UnknownUser,

    #[error("password hash mismatch")]
    Mismatch,

    #[error("user is disabled")]
    Disabled,

    #[error("user already exists: {0}")]
    AlreadyExists(String),
}

/// A user as stored by the credential store.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub salt: String,
    pub hash: String,
    pub disabled: bool,
}

/// Storage of user credentials.
pub trait CredentialStore: Send + Sync {
    /// Add a new user.
    fn register(&self, user: UserRecord) -> Result<(), CredentialError>;

    /// The salt the user's password was hashed with.
    fn salt_for(&self, username: &str) -> Result<String, CredentialError>;

    /// Confirm that `candidate_hash` equals the user's stored hash.
    fn verify(&self, username: &str, candidate_hash: &str) -> Result<(), CredentialError>;
}

/// Process-local credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable a user. Returns false if the user does not exist.
    pub fn set_disabled(&self, username: &str, disabled: bool) -> bool {
        match self.users.write().get_mut(username) {
            Some(user) => {
                user.disabled = disabled;
                true
            }
            None => false,
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn register(&self, user: UserRecord) -> Result<(), CredentialError> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(CredentialError::AlreadyExists(user.username));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    fn salt_for(&self, username: &str) -> Result<String, CredentialError> {
        self.users
            .read()
            .get(username)
            .map(|u| u.salt.clone())
            .ok_or(CredentialError::UnknownUser)
    }

    fn verify(&self, username: &str, candidate_hash: &str) -> Result<(), CredentialError> {
        let users = self.users.read();
        let user = users.get(username).ok_or(CredentialError::UnknownUser)?;
        if !hashes_match(candidate_hash, &user.hash) {
            return Err(CredentialError::Mismatch);
        }
        if user.disabled {
            return Err(CredentialError::Disabled);
        }
        Ok(())
    }
}

/// Salt hashed against when the user is unknown, so every login attempt
/// costs one password hash.
const ABSENT_USER_SALT: &str = "sessiongate-absent-user";

/// Check a username/password pair against `store`.
///
/// Every failure, whether an unknown user or a wrong password, collapses to
/// [`AuthError::CredentialMismatch`] after the same hashing work.
pub fn check_credentials(
    auth: &dyn Authenticator,
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    let result = match store.salt_for(username) {
        Ok(salt) => store.verify(username, &auth.hash_password(password, &salt)),
        Err(e) => {
            auth.hash_password(password, ABSENT_USER_SALT);
            Err(e)
        }
    };

    result.map_err(|_| {
        debug!("Credential check failed for '{}'", username);
        AuthError::CredentialMismatch
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialHasher, SessionManager};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn manager() -> SessionManager {
        SessionManager::new(Duration::from_secs(60), CredentialHasher::new(10, 16))
    }

    fn register(store: &InMemoryCredentialStore, auth: &dyn Authenticator, name: &str, pw: &str) {
        let salt = format!("{name}-salt");
        store
            .register(UserRecord {
                username: name.to_string(),
                fullname: String::new(),
                email: String::new(),
                hash: auth.hash_password(pw, &salt),
                salt,
                disabled: false,
            })
            .unwrap();
    }

    #[test]
    fn test_check_credentials() {
        let auth = manager();
        let store = InMemoryCredentialStore::new();
        register(&store, &auth, "alice", "wonderland");

        assert!(check_credentials(&auth, &store, "alice", "wonderland").is_ok());
        assert!(matches!(
            check_credentials(&auth, &store, "alice", "looking-glass"),
            Err(AuthError::CredentialMismatch)
        ));
        assert!(matches!(
            check_credentials(&auth, &store, "bob", "wonderland"),
            Err(AuthError::CredentialMismatch)
        ));
    }

    #[test]
    fn test_duplicate_username() {
        let auth = manager();
        let store = InMemoryCredentialStore::new();
        register(&store, &auth, "alice", "one");

        let err = store
            .register(UserRecord {
                username: "alice".to_string(),
                fullname: String::new(),
                email: String::new(),
                salt: "x".to_string(),
                hash: "y".to_string(),
                disabled: false,
            })
            .unwrap_err();
        assert!(matches!(err, CredentialError::AlreadyExists(name) if name == "alice"));
    }

    #[test]
    fn test_disabled_user_cannot_log_in() {
        let auth = manager();
        let store = InMemoryCredentialStore::new();
        register(&store, &auth, "alice", "wonderland");

        assert!(store.set_disabled("alice", true));
        assert!(matches!(
            store.verify("alice", &auth.hash_password("wonderland", "alice-salt")),
            Err(CredentialError::Disabled)
        ));
        assert!(check_credentials(&auth, &store, "alice", "wonderland").is_err());
        assert!(!store.set_disabled("nobody", true));
    }

    /// Counts password hashes, delegating everything to a real manager.
    struct CountingAuth {
        inner: SessionManager,
        hashes: AtomicUsize,
    }

    impl Authenticator for CountingAuth {
        fn create_session(&self) -> Result<String, AuthError> {
            self.inner.create_session()
        }

        fn validate_session(&self, token: &str) -> Result<(), AuthError> {
            self.inner.validate_session(token)
        }

        fn end_session(&self, token: &str) {
            self.inner.end_session(token)
        }

        fn hash_password(&self, password: &str, salt: &str) -> String {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash_password(password, salt)
        }
    }

    #[test]
    fn test_unknown_user_still_hashes_once() {
        let auth = CountingAuth {
            inner: manager(),
            hashes: AtomicUsize::new(0),
        };
        let store = InMemoryCredentialStore::new();
        register(&store, &auth, "alice", "wonderland");
        auth.hashes.store(0, Ordering::SeqCst);

        assert!(check_credentials(&auth, &store, "alice", "looking-glass").is_err());
        assert_eq!(auth.hashes.load(Ordering::SeqCst), 1);

        assert!(matches!(
            check_credentials(&auth, &store, "bob", "wonderland"),
            Err(AuthError::CredentialMismatch)
        ));
        assert_eq!(auth.hashes.load(Ordering::SeqCst), 2);
    }
}
