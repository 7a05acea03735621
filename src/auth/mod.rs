//! Authentication core: token generation, credential hashing and the
//! session manager that composes them.
//!
//! Request handlers only ever see the [`Authenticator`] capability set, so a
//! different scheme (e.g. signed stateless tokens) can be dropped in without
//! touching callers.

mod hasher;
mod manager;
mod token;

pub use hasher::{hashes_match, pbkdf2_sha512_hex, CredentialHasher};
pub use manager::SessionManager;
pub use token::{
    generate_token, generate_token_from, OsTokenGenerator, TokenGenerator, ALPHABET, SALT_LEN,
    SESSION_TOKEN_LEN,
};

use thiserror::Error;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "SESSIONID";

/// Scheme name for server-side session management.
pub const SESSION_SCHEME: &str = "session";

/// The operating system's secure random source failed.
#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct EntropyError(String);

impl EntropyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Why a presented token was rejected. Only ever logged, never sent to
/// the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    UnknownToken,
    Expired,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing",
            AuthFailure::UnknownToken => "unknown",
            AuthFailure::Expired => "expired",
        }
    }
}

/// Errors surfaced by the authentication core.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("not authenticated")]
    Authentication(AuthFailure),

    #[error("invalid credentials")]
    CredentialMismatch,
}

/// Capability set of an authentication scheme.
pub trait Authenticator: Send + Sync {
    /// Start a new session and return its token.
    fn create_session(&self) -> Result<String, AuthError>;

    /// Check a presented token, refreshing it on success.
    fn validate_session(&self, token: &str) -> Result<(), AuthError>;

    /// End a session. Ending an unknown session is not an error.
    fn end_session(&self, token: &str);

    /// Hash a password with the scheme's configured KDF parameters.
    fn hash_password(&self, password: &str, salt: &str) -> String;

    /// Drop state for sessions that have already expired, returning how
    /// many were removed. Stateless schemes have nothing to sweep.
    fn sweep_expired(&self) -> usize {
        0
    }
}
