//! Store Registry
//!
//! One per data directory. Hands out [`Collection`] handles that share a
//! write lock per collection name, so every writer to `sessions` in the
//! process goes through the same lock no matter where the handle came from.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::collection::Collection;
use crate::domain::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};
use crate::infra::json_file::JsonFileEngine;
use crate::infra::memory::MemoryEngine;

pub const MAX_COLLECTION_NAME_LEN: usize = 64;

struct RegistryInner<E> {
    engine: Arc<E>,
    collections: Mutex<HashMap<String, Collection<E>>>,
}

pub struct StoreRegistry<E> {
    inner: Arc<RegistryInner<E>>,
}

impl<E> Clone for StoreRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for StoreRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry").finish_non_exhaustive()
    }
}

impl StoreRegistry<JsonFileEngine> {
    /// Registry over `<dir>/<name>.json` files. The directory is created on
    /// first write.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let engine = JsonFileEngine::new(dir);
        tracing::info!(data_dir = %engine.dir().display(), "Document store opened");
        Self::new(engine)
    }
}

impl StoreRegistry<MemoryEngine> {
    pub fn in_memory() -> Self {
        Self::new(MemoryEngine::new())
    }
}

impl<E> StoreRegistry<E>
where
    E: StorageEngine + Send + Sync + 'static,
{
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                engine: Arc::new(engine),
                collections: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    /// Handle for `name`, created on first use
    pub fn store(&self, name: &str) -> StoreResult<Collection<E>> {
        validate_collection_name(name)?;

        let mut collections = self
            .inner
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| {
                Collection::new(
                    name,
                    Arc::clone(&self.inner.engine),
                    Arc::new(tokio::sync::Mutex::new(())),
                )
            })
            .clone();

        Ok(collection)
    }
}

/// ASCII letters, digits, `_` and `-`; at most [`MAX_COLLECTION_NAME_LEN`]
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_string()))
    }
}
