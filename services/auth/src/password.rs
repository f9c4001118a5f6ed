//! Password hashing and verification using Argon2id

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use tracing::warn;

/// Password hashing service
///
/// Uses Argon2id with the RFC 9106 low-memory parameters (19 MiB memory,
/// 2 iterations, 1 lane, 32-byte output), which are the `argon2` crate
/// defaults.
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a new password service
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hash a plaintext password with a freshly generated salt
    ///
    /// Returns a PHC-format string encoding the algorithm parameters, the
    /// salt, and the derived key, suitable for storage.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

        Ok(password_hash.to_string())
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// Returns `false` for a non-matching password. A malformed or
    /// unparsable stored hash also returns `false`: verification fails
    /// closed rather than surfacing an error that a caller could mistake
    /// for success.
    pub fn verify(&self, stored_hash: &str, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Rejecting login against malformed password hash: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let service = PasswordService::new();
        let hash = service.hash("Password123").unwrap();

        assert!(service.verify(&hash, "Password123"));
        assert!(!service.verify(&hash, "Password124"));
        assert!(!service.verify(&hash, ""));
    }

    #[test]
    fn test_hash_output_is_phc_format() {
        let service = PasswordService::new();
        let hash = service.hash("Password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let service = PasswordService::new();
        let first = service.hash("Password123").unwrap();
        let second = service.hash("Password123").unwrap();

        assert_ne!(first, second);
        assert!(service.verify(&first, "Password123"));
        assert!(service.verify(&second, "Password123"));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        let service = PasswordService::new();

        assert!(!service.verify("", "Password123"));
        assert!(!service.verify("not-a-phc-string", "Password123"));
        assert!(!service.verify("$argon2id$corrupt", "Password123"));
    }
}
