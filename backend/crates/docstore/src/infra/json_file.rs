//! JSON File Engine
//!
//! One pretty-printed JSON array per collection at `<dir>/<name>.json`.
//! Writes go to a uniquely named temp file in the same directory, are
//! fsynced, then renamed over the target. Rename within a directory is
//! atomic on POSIX filesystems, so a reader sees the old file or the new
//! one, and a crash mid-write leaves the old file in place.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use kernel::id::DocumentId;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::document::Document;
use crate::domain::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};

const EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone)]
pub struct JsonFileEngine {
    dir: PathBuf,
}

impl JsonFileEngine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.{EXTENSION}"))
    }

    fn temp_path_for(&self, collection: &str) -> PathBuf {
        // Leading dot and random part keep temp files distinct from
        // collection files and from each other.
        self.dir.join(format!(
            ".{collection}.{}.{TEMP_SUFFIX}",
            DocumentId::new().as_str()
        ))
    }

    fn parse(collection: &str, bytes: &[u8]) -> StoreResult<Vec<Document>> {
        let documents: Vec<Document> =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;

        for (index, document) in documents.iter().enumerate() {
            document
                .validate_stored()
                .map_err(|reason| StoreError::Corrupt {
                    collection: collection.to_string(),
                    reason: format!("element {index}: {reason}"),
                })?;
        }

        Ok(documents)
    }

    async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
}

impl StorageEngine for JsonFileEngine {
    async fn load(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let path = self.path_for(collection);

        match fs::read(&path).await {
            Ok(bytes) => Self::parse(collection, &bytes),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io {
                collection: collection.to_string(),
                source: e,
            }),
        }
    }

    async fn persist(&self, collection: &str, documents: &[Document]) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            collection: collection.to_string(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(documents).map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            source,
        })?;

        fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let temp_path = self.temp_path_for(collection);
        let target = self.path_for(collection);

        let written = match Self::write_synced(&temp_path, &bytes).await {
            Ok(()) => fs::rename(&temp_path, &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != IoErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %cleanup,
                        "Failed to remove temp file after aborted write"
                    );
                }
            }
            return Err(io_err(e));
        }

        tracing::debug!(
            collection = collection,
            documents = documents.len(),
            bytes = bytes.len(),
            "Collection persisted"
        );

        Ok(())
    }
}
