//! One-way password hashing for login passwords and reset OTPs.

use anyhow::{anyhow, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};
use rand::rngs::OsRng;

/// Argon2id hasher with the library defaults. Both login passwords and
/// OTPs go through here; plaintext never leaves this module.
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hash `plaintext` with a fresh random salt into a PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash secret: {err}"))?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored PHC string. A malformed stored
    /// value verifies as `false` rather than erroring.
    #[must_use]
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
