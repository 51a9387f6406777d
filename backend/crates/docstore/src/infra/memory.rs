//! In-Memory Engine
//!
//! Keeps collections in a map. Same semantics as the file engine minus
//! durability; used by tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::document::Document;
use crate::domain::engine::StorageEngine;
use crate::error::StoreResult;

#[derive(Debug, Default)]
pub struct MemoryEngine {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        // A panic elsewhere cannot leave a half-replaced Vec behind, so the
        // data is still consistent after poisoning.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageEngine for MemoryEngine {
    async fn load(&self, collection: &str) -> StoreResult<Vec<Document>> {
        Ok(self.lock().get(collection).cloned().unwrap_or_default())
    }

    async fn persist(&self, collection: &str, documents: &[Document]) -> StoreResult<()> {
        self.lock()
            .insert(collection.to_string(), documents.to_vec());
        Ok(())
    }
}
