//! sessiongate - session-based authentication service
//!
//! This library provides the authentication core (token generation,
//! PBKDF2 credential hashing, in-memory sessions with sliding expiry)
//! and the HTTP surface that exposes it.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod session;
