//! Credential hashing and session token helpers
//!
//! Passwords are stored as salted SHA-256 digests (`password_hash` +
//! `password_salt` columns); session tokens are random 256-bit hex
//! strings stored in the sessions table.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions and random generation.
//! HTTP session enforcement lives in the service crate's middleware.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a random 16-byte hex salt
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex_encode(&bytes)
}

/// Hash a password with its salt (SHA-256 of salt || password)
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-shape verification against a stored hash
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

/// Generate a random 32-byte hex session token
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let salt = "00ff00ff00ff00ff00ff00ff00ff00ff";
        let a = hash_password("secret", salt);
        let b = hash_password("secret", salt);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_salts_different_hashes() {
        let a = hash_password("secret", "aaaa");
        let b = hash_password("secret", "bbbb");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_round_trip() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);
        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
    }

    #[test]
    fn test_session_tokens_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
