//! Password hashing and API token generation.

use anyhow::Result;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

const TOKEN_BYTES: usize = 20;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes `password` with Argon2id and a fresh random salt.
/// The stored form is a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks `password` against a value produced by [`hash_password`].
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// A new random token key, 40 hex characters.
pub fn new_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_password("testpass123").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("testpass123", &stored));
        assert!(!verify_password("testpass124", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$aa$bb"));
        assert!(!verify_password("x", "$argon2id$v=19$m=19456,t=2,p=1$onlysalt"));
    }

    #[test]
    fn test_single_round_digest_is_rejected() {
        // Salted SHA-256 strings are not PHC hashes.
        let legacy = "sha256$00112233$9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        assert!(!verify_password("test", legacy));
    }

    #[test]
    fn test_token_key_shape() {
        let key = new_token_key();
        assert_eq!(key.len(), TOKEN_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, new_token_key());
    }
}
