//! Storage Engine Trait
//!
//! An engine persists whole collections and does no locking or merging.
//! [`crate::Collection`] layers the read-modify-write discipline on top.

use crate::domain::document::Document;
use crate::error::StoreResult;

#[trait_variant::make(StorageEngine: Send)]
pub trait LocalStorageEngine {
    /// Load the full collection. A collection that was never written is
    /// empty, not an error.
    async fn load(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Replace the full collection. Readers must observe either the old or
    /// the new contents, never a mix.
    async fn persist(&self, collection: &str, documents: &[Document]) -> StoreResult<()>;
}
