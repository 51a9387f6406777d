//! Infrastructure Layer
//!
//! Repository implementations over the document store.

pub mod document;

pub use document::DocumentAuthRepository;
