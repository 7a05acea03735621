//! PBKDF2-HMAC-SHA512 password hashing.

use sha2::Sha512;
use subtle::ConstantTimeEq;

/// Derive a `key_length`-byte key from `password` and `salt` and return it
/// as lowercase hex.
///
/// Deterministic: the same inputs always produce the same string, which is
/// what lets a login re-hash the presented password and compare it with the
/// hash stored at registration.
pub fn pbkdf2_sha512_hex(
    password: &str,
    salt: &str,
    iterations: u32,
    key_length: usize,
) -> String {
    let mut key = vec![0u8; key_length];
    pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

/// Compare two hashes without short-circuiting on the first differing byte.
pub fn hashes_match(computed: &str, stored: &str) -> bool {
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// KDF parameters fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialHasher {
    iterations: u32,
    key_length: usize,
}

impl CredentialHasher {
    pub fn new(iterations: u32, key_length: usize) -> Self {
        Self {
            iterations,
            key_length,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn hash(&self, password: &str, salt: &str) -> String {
        pbkdf2_sha512_hex(password, salt, self.iterations, self.key_length)
    }
}
