//! Session Token Value Object
//!
//! Opaque bearer token: 32 random bytes, lower-case hex. The token is the
//! only thing a client holds; it carries no data and is never logged.

use std::fmt;

use platform::crypto::{TOKEN_BYTES, constant_time_eq, random_token_hex};
use serde::{Deserialize, Serialize};

/// Length of the hex form
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Fresh token from the OS CSPRNG
    pub fn generate() -> Self {
        Self(random_token_hex(TOKEN_BYTES))
    }

    /// Accept a token presented by a client. Anything that could not have
    /// been issued here is rejected without touching storage.
    pub fn from_presented(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == TOKEN_HEX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a stored token
    pub fn matches(&self, stored: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), stored.as_bytes())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}
