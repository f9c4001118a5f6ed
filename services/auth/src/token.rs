//! Session token generation and session id derivation
//!
//! Clients hold a random base32 token in an HTTP-only cookie; the database
//! stores only the SHA-256 of that token as the session id. The server can
//! always recompute the id from a presented token, but a leaked session
//! table cannot be replayed as valid cookies.

use base32::Alphabet;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Bytes of entropy in a session token
pub const SESSION_TOKEN_BYTES: usize = 20;

/// Generate a new random session token
///
/// The raw value is only handed to the client as the cookie value; it is
/// never persisted.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base32::encode(Alphabet::Rfc4648Lower { padding: false }, &bytes)
}

/// Derive the session id stored server-side from a raw token
///
/// Deterministic: the same token always maps to the same id, so a presented
/// cookie resolves to its session row with a single lookup.
pub fn session_id_from_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_format() {
        let token = generate_session_token();

        // 20 bytes of entropy encode to 32 unpadded base32 characters
        assert_eq!(token.len(), 32);
        assert!(!token.contains('='));
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_session_id_is_deterministic() {
        let token = generate_session_token();

        assert_eq!(session_id_from_token(&token), session_id_from_token(&token));
    }

    #[test]
    fn test_session_id_format() {
        let id = session_id_from_token("abc");

        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn test_session_id_differs_from_token() {
        let token = generate_session_token();

        assert_ne!(session_id_from_token(&token), token);
    }

    #[test]
    fn test_distinct_tokens_produce_distinct_ids() {
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let token = generate_session_token();
            assert!(
                ids.insert(session_id_from_token(&token)),
                "session id collision"
            );
        }
    }
}
