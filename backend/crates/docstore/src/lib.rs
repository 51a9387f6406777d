//! Document Store
//!
//! File-backed persistence for named collections of schema-free documents.
//!
//! - `domain/` - [`Document`] and the [`StorageEngine`] seam
//! - `infra/` - engines: one JSON file per collection, or in-memory
//! - [`Collection`] - read / create / update / delete / find_by on one collection
//! - [`StoreRegistry`] - hands out one shared handle per collection name
//!
//! ## Consistency Model
//! - Every mutation rewrites the whole collection, replacing the previous
//!   version atomically (temp file + rename), so readers only ever see a
//!   complete prior write
//! - Mutations on one collection are serialized by a per-collection lock;
//!   concurrent writers never lose each other's changes
//! - Nothing is ordered across collections
//! - Only one process may own a data directory

pub mod collection;
pub mod domain;
pub mod error;
pub mod infra;
pub mod registry;

pub use collection::Collection;
pub use domain::document::Document;
pub use domain::engine::{LocalStorageEngine, StorageEngine};
pub use error::{StoreError, StoreResult};
pub use infra::json_file::JsonFileEngine;
pub use infra::memory::MemoryEngine;
pub use registry::StoreRegistry;

#[cfg(test)]
mod tests;
