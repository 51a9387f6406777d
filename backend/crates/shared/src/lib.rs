//! Shared Kernel
//!
//! Vocabulary every crate in the workspace agrees on:
//! - [`error::app_error::AppError`] and its HTTP-facing [`error::kind::ErrorKind`]
//! - Typed, string-backed identifiers ([`id::Id`])
//!
//! Nothing in here knows about storage engines or authentication. If a type
//! needs either, it belongs in `docstore` or `auth`.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
