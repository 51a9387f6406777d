//! Store Error Types

use kernel::error::kind::ErrorKind;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Collection names map to file names and are restricted accordingly
    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    /// Payload is not usable as a document
    #[error("Invalid document: {0}")]
    Validation(String),

    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    /// Unique-field create found an existing match
    #[error("A document in {collection} already has this {field}")]
    Conflict { collection: String, field: String },

    #[error("I/O error on collection {collection}: {source}")]
    Io {
        collection: String,
        source: std::io::Error,
    },

    /// Persisted data exists but is not a JSON array of documents
    #[error("Collection {collection} is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("Failed to encode collection {collection}: {source}")]
    Encode {
        collection: String,
        source: serde_json::Error,
    },

    /// Stored document does not fit the typed view asked for
    #[error("Document does not match the expected shape: {0}")]
    Decode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidCollectionName(_) | StoreError::Validation(_) => {
                ErrorKind::BadRequest
            }
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Io { .. }
            | StoreError::Corrupt { .. }
            | StoreError::Encode { .. }
            | StoreError::Decode(_) => ErrorKind::InternalServerError,
        }
    }

    /// I/O failure or unreadable data, as opposed to a caller mistake
    pub fn is_storage_failure(&self) -> bool {
        self.kind().is_server_error()
    }
}
