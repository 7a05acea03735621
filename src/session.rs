//! In-memory session store with sliding expiration.
//!
//! Every operation runs under one exclusive lock over the whole table, so a
//! token's uniqueness check, its insertion, its refresh and its removal are
//! all serialized against each other.

use crate::auth::{EntropyError, OsTokenGenerator, TokenGenerator, SESSION_TOKEN_LEN};
use crate::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// A live session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub last_activity: Instant,
}

/// Why [`SessionStore::validate`] rejected a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,
}

/// Thread-safe in-memory session table.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl SessionStore {
    /// Store with the system clock and OS-backed tokens.
    pub fn new(ttl: Duration) -> Self {
        Self::with_parts(ttl, Arc::new(SystemClock), Arc::new(OsTokenGenerator))
    }

    pub fn with_parts(
        ttl: Duration,
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            clock,
            tokens,
        }
    }

    /// Idle time after which a session is expired.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a new session and return its token.
    ///
    /// Generation is repeated until the candidate is not already live; the
    /// lock is held across generate, check and insert.
    pub fn create_session(&self) -> Result<String, EntropyError> {
        let mut sessions = self.sessions.lock();

        let token = loop {
            let candidate = self.tokens.generate(SESSION_TOKEN_LEN)?;
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
            debug!("Session token collision, regenerating");
        };

        sessions.insert(
            token.clone(),
            Session {
                token: token.clone(),
                last_activity: self.clock.now(),
            },
        );
        debug!("Created session {}… ({} live)", short(&token), sessions.len());

        Ok(token)
    }

    /// Check a token and slide its expiry window forward.
    ///
    /// An expired session is removed on the spot.
    pub fn validate(&self, token: &str) -> Result<(), ValidateError> {
        let mut sessions = self.sessions.lock();
        let now = self.clock.now();

        let Some(session) = sessions.get_mut(token) else {
            return Err(ValidateError::NotFound);
        };

        if now.saturating_duration_since(session.last_activity) > self.ttl {
            sessions.remove(token);
            debug!("Evicted expired session {}…", short(token));
            return Err(ValidateError::Expired);
        }

        session.last_activity = now;
        Ok(())
    }

    /// Remove a session (logout). Returns whether it was present.
    pub fn remove(&self, token: &str) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    /// Remove all expired sessions, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let now = self.clock.now();
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_activity) <= self.ttl);
        before - sessions.len()
    }

    /// Snapshot of a live session, without refreshing it.
    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.lock().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

/// Leading characters of a token, enough to correlate log lines.
fn short(token: &str) -> &str {
    token.get(..4).unwrap_or(token)
}
