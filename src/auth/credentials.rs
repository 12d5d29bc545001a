//! Password hashing and verification.
//!
//! Plaintext never reaches the store; a malformed stored hash reads as a
//! mismatch rather than an error.

use crate::error::{Error, Result};

const HASH_COST: u32 = 12;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, HASH_COST)
        .map_err(|e| Error::Validation(format!("failed to hash password: {e}")))
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_garbage_hash_reads_as_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
