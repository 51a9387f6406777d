//! Password Hashing and Verification
//!
//! PBKDF2-HMAC with a per-hash random salt, stored as a single
//! self-describing string:
//!
//! ```text
//! pbkdf2$<iterations>$<digest>$<saltHex>$<derivedKeyHex>
//! ```
//!
//! The layout is shared with credentials that already exist on disk and must
//! not change. Everything needed to verify a password lives in that string.
//!
//! ## Security Features
//! - Fresh 16-byte salt per hash, so equal passwords never share a hash
//! - Constant-time comparison of derived keys
//! - Verification fails closed on any malformed input
//! - Stored parameters are checked against an allowed range before use
//! - Clear text is zeroized on drop and redacted from `Debug`

use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time_eq, random_bytes};

// ============================================================================
// Constants
// ============================================================================

/// Algorithm tag, first field of the stored string
pub const ALGORITHM_TAG: &str = "pbkdf2";

/// Iteration count for new hashes
pub const PBKDF2_ITERATIONS: u32 = 120_000;

/// Salt length for new hashes (bytes)
pub const SALT_LEN: usize = 16;

/// Derived key length for new hashes (bytes)
pub const KEY_LEN: usize = 64;

/// Stored hashes below this count are rejected (downgrade protection)
pub const MIN_ITERATIONS: u32 = PBKDF2_ITERATIONS;

/// Stored hashes above this count are rejected (CPU exhaustion)
pub const MAX_ITERATIONS: u32 = 10_000_000;

const MIN_KEY_LEN: usize = 16;
const MAX_KEY_LEN: usize = 256;

/// Minimum password length for new passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length for new passwords
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// A syntactically valid hash no password is known for.
///
/// Sign-in verifies against it when the account does not exist so that an
/// unknown email costs the same time as a wrong password.
pub const DUMMY_HASH: &str = "pbkdf2$120000$sha512$ab6dd2a97e4b4be858e5318c69f8b485$b4cd1c9b70553717091d801b1fd79165b033387d1ac0aa66bc15c317413735ec2de743cf75bb7805de5e212ccacd02f05d07ec5b2567d9a82f6db26ab174e45a";

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violations (new passwords only)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// Nothing to hash
    #[error("Password must not be empty")]
    EmptyPassword,

    /// Stored string is not `pbkdf2$<iter>$<digest>$<salt>$<key>`
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Digest
// ============================================================================

/// HMAC digest named in the third field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub const fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    fn derive(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        match self {
            DigestAlgorithm::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
            DigestAlgorithm::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, out),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(PasswordHashError::InvalidHashFormat),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Parsed hash
// ============================================================================

/// Structured form of a stored hash string.
///
/// `to_string()` reproduces the stored layout exactly (lowercase hex).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub iterations: u32,
    pub digest: DigestAlgorithm,
    pub salt: Vec<u8>,
    pub key: Vec<u8>,
}

impl PasswordHash {
    /// Derive a new hash with fresh salt and the current parameters
    pub fn generate(password: &[u8]) -> Self {
        let salt = random_bytes(SALT_LEN);
        let digest = DigestAlgorithm::Sha512;
        let mut key = vec![0u8; KEY_LEN];
        digest.derive(password, &salt, PBKDF2_ITERATIONS, &mut key);

        Self {
            iterations: PBKDF2_ITERATIONS,
            digest,
            salt,
            key,
        }
    }

    /// Whether the stored parameters are ones this service is willing to
    /// run. Out-of-range hashes never verify.
    pub fn parameters_allowed(&self) -> bool {
        (MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations)
            && !self.salt.is_empty()
            && (MIN_KEY_LEN..=MAX_KEY_LEN).contains(&self.key.len())
    }

    /// Re-derive with the embedded parameters and compare in constant time
    pub fn verify(&self, password: &[u8]) -> bool {
        if !self.parameters_allowed() {
            return false;
        }

        let mut derived = vec![0u8; self.key.len()];
        self.digest
            .derive(password, &self.salt, self.iterations, &mut derived);

        let matches = constant_time_eq(&derived, &self.key);
        derived.zeroize();
        matches
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('$').collect();
        let [tag, iterations, digest, salt, key] = fields.as_slice() else {
            return Err(PasswordHashError::InvalidHashFormat);
        };

        if *tag != ALGORITHM_TAG {
            return Err(PasswordHashError::InvalidHashFormat);
        }

        let iterations = iterations
            .parse::<u32>()
            .map_err(|_| PasswordHashError::InvalidHashFormat)?;
        let digest = digest.parse::<DigestAlgorithm>()?;
        let salt = hex::decode(salt).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        let key = hex::decode(key).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        if salt.is_empty() || key.is_empty() {
            return Err(PasswordHashError::InvalidHashFormat);
        }

        Ok(Self {
            iterations,
            digest,
            salt,
            key,
        })
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}${}${}${}${}",
            ALGORITHM_TAG,
            self.iterations,
            self.digest,
            hex::encode(&self.salt),
            hex::encode(&self.key)
        )
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("iterations", &self.iterations)
            .field("digest", &self.digest)
            .field("salt", &"[SALT]")
            .field("key", &"[KEY]")
            .finish()
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, erased from memory on drop.
///
/// Not `Clone`, and `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Accept a new password (sign-up, password change) after policy checks:
    /// 8 to 128 code points, not whitespace-only, no control characters
    /// other than space, tab and newline.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let candidate = Self(raw);

        if candidate.0.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = candidate.0.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if candidate
            .0
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(candidate)
    }

    /// Wrap a password presented for verification (sign-in). No policy is
    /// applied; a password that fails policy simply will not verify.
    pub fn for_verification(raw: String) -> Self {
        Self(raw)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with a fresh salt
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        if self.0.is_empty() {
            return Err(PasswordHashError::EmptyPassword);
        }
        Ok(HashedPassword(PasswordHash::generate(self.as_bytes()).to_string()))
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Stored hash string, as persisted in `passwordHash`.
///
/// Deserialization does not validate: a corrupt value must still load so
/// that verification can fail closed instead of the whole record failing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a stored string, validating the layout
    pub fn parse(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let s = s.into();
        s.parse::<PasswordHash>()?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Structured view of the stored string
    pub fn parsed(&self) -> Result<PasswordHash, PasswordHashError> {
        self.0.parse()
    }

    /// Verify a password against this hash; malformed hashes yield `false`
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        match self.parsed() {
            Ok(hash) => hash.verify(password.as_bytes()),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashedPassword").field(&"[HASH]").finish()
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Hash a plaintext password into the stored string format
pub fn hash_password(plaintext: &str) -> Result<String, PasswordHashError> {
    ClearTextPassword::for_verification(plaintext.to_owned())
        .hash()
        .map(HashedPassword::into_string)
}

/// Verify a plaintext password against a stored string.
///
/// Never panics; anything malformed is simply `false`.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    match stored.parse::<PasswordHash>() {
        Ok(hash) => hash.verify(plaintext.as_bytes()),
        Err(_) => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
