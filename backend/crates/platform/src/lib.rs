//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business meaning:
//! - Cryptographic utilities (random tokens, constant-time comparison)
//! - Password hashing (PBKDF2, self-describing `pbkdf2$...` strings)
//! - Cookie building and parsing
//! - Clock abstraction so expiry logic can be tested

pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
