//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};

/// Session tokens carry 256 bits of entropy.
pub const TOKEN_BYTES: usize = 32;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Opaque random token, lowercase hex of `len` random bytes
pub fn random_token_hex(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// Constant-time comparison to prevent timing attacks.
///
/// Only the length is allowed to leak.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
        assert!(random_bytes(0).is_empty());
    }

    #[test]
    fn test_random_token_hex() {
        let token = random_token_hex(TOKEN_BYTES);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, random_token_hex(TOKEN_BYTES));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abcd", b"abc"));
        assert!(constant_time_eq(b"", b""));
    }
}
