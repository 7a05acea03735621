//! Random identifiers over a 62-character alphabet.

use super::EntropyError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Uppercase, lowercase, then digits.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890";

/// Length of a session token.
pub const SESSION_TOKEN_LEN: usize = 16;

/// Length of a per-user password salt.
pub const SALT_LEN: usize = 16;

/// Source of random identifiers.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, length: usize) -> Result<String, EntropyError>;
}

/// Generator backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn generate(&self, length: usize) -> Result<String, EntropyError> {
        generate_token(length)
    }
}

/// Generate a `length`-character identifier from the OS random source.
pub fn generate_token(length: usize) -> Result<String, EntropyError> {
    generate_token_from(&mut OsRng, length)
}

/// Generate a `length`-character identifier from `rng`.
///
/// Each random byte is reduced modulo the alphabet size. A failing source is
/// reported as [`EntropyError`] and never retried here.
pub fn generate_token_from<R: RngCore + ?Sized>(
    rng: &mut R,
    length: usize,
) -> Result<String, EntropyError> {
    let mut bytes = vec![0u8; length];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| EntropyError::new(e.to_string()))?;

    Ok(bytes
        .into_iter()
        .map(|b| ALPHABET[b as usize % ALPHABET.len()] as char)
        .collect())
}
