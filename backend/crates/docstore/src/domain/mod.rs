//! Domain Layer
//!
//! The document type and the storage engine contract.

pub mod document;
pub mod engine;
