//! Collection
//!
//! Handle to one named collection. Reads go straight to the engine.
//! Mutations hold the collection's write lock across load, modify and
//! persist, so two concurrent writers always see each other's results.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::document::{Document, into_object};
use crate::domain::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};

/// Outcome of a mutation closure: whether the collection changed, plus a
/// value to hand back to the caller.
struct Mutation<T> {
    changed: bool,
    output: T,
}

impl<T> Mutation<T> {
    fn changed(output: T) -> Self {
        Self {
            changed: true,
            output,
        }
    }

    fn unchanged(output: T) -> Self {
        Self {
            changed: false,
            output,
        }
    }
}

pub struct Collection<E> {
    name: Arc<str>,
    engine: Arc<E>,
    write_lock: Arc<Mutex<()>>,
}

// Manual impl: cloning a handle must not require `E: Clone`.
impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            engine: Arc::clone(&self.engine),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<E> std::fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<E> Collection<E>
where
    E: StorageEngine + Send + Sync + 'static,
{
    /// Handles for the same collection must share `write_lock`; use
    /// [`crate::StoreRegistry`] rather than calling this directly.
    pub(crate) fn new(name: &str, engine: Arc<E>, write_lock: Arc<Mutex<()>>) -> Self {
        Self {
            name: Arc::from(name),
            engine,
            write_lock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All documents in persisted order
    pub async fn read(&self) -> StoreResult<Vec<Document>> {
        self.engine.load(&self.name).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.read().await?.into_iter().find(|d| d.id() == id))
    }

    /// All documents whose `field` equals `value` exactly
    pub async fn find_by(&self, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        Ok(self
            .read()
            .await?
            .into_iter()
            .filter(|d| d.field_equals(field, value))
            .collect())
    }

    /// Append a new document with a generated id
    pub async fn create(&self, fields: Value) -> StoreResult<Document> {
        let document = Document::create(fields, Utc::now())?;

        self.mutate(|documents| {
            documents.push(document.clone());
            Ok(Mutation::changed(()))
        })
        .await?;

        tracing::debug!(collection = %self.name, id = document.id(), "Document created");
        Ok(document)
    }

    /// Like [`Collection::create`], but fails with `Conflict` if a document
    /// already has the same value in `field`. The check and the append run
    /// under the same lock.
    pub async fn create_unique(&self, field: &str, fields: Value) -> StoreResult<Document> {
        let key = fields.get(field).cloned();
        self.create_unique_by(field, fields, |existing| Some(existing) == key.as_ref())
            .await
    }

    /// [`Collection::create_unique`] with a custom notion of "same value".
    ///
    /// `conflicts` is called with the `field` value of each stored document
    /// that has one; documents without the field never conflict.
    pub async fn create_unique_by<P>(
        &self,
        field: &str,
        fields: Value,
        conflicts: P,
    ) -> StoreResult<Document>
    where
        P: Fn(&Value) -> bool + Send + Sync,
    {
        let document = Document::create(fields, Utc::now())?;
        if document.get(field).is_none() {
            return Err(StoreError::Validation(format!("missing unique field `{field}`")));
        }

        self.mutate(|documents| {
            if documents.iter().any(|d| d.get(field).is_some_and(&conflicts)) {
                return Err(StoreError::Conflict {
                    collection: self.name.to_string(),
                    field: field.to_string(),
                });
            }
            documents.push(document.clone());
            Ok(Mutation::changed(()))
        })
        .await?;

        Ok(document)
    }

    /// Shallow-merge `patch` into the document with `id`
    pub async fn update(&self, id: &str, patch: Value) -> StoreResult<Document> {
        let patch = into_object(patch)?;
        let now = Utc::now();

        self.mutate(|documents| {
            let Some(document) = documents.iter_mut().find(|d| d.id() == id) else {
                return Err(StoreError::NotFound {
                    collection: self.name.to_string(),
                    id: id.to_string(),
                });
            };
            document.merge(patch, now);
            Ok(Mutation::changed(document.clone()))
        })
        .await
    }

    /// Remove the document with `id`. Returns whether it existed; nothing is
    /// written when it did not.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let deleted = self
            .mutate(|documents| {
                let before = documents.len();
                documents.retain(|d| d.id() != id);
                Ok(if documents.len() < before {
                    Mutation::changed(true)
                } else {
                    Mutation::unchanged(false)
                })
            })
            .await?;

        if deleted {
            tracing::debug!(collection = %self.name, id = id, "Document deleted");
        }
        Ok(deleted)
    }

    /// Remove every document matching `predicate`, returning how many went
    pub async fn delete_where<P>(&self, predicate: P) -> StoreResult<usize>
    where
        P: Fn(&Document) -> bool + Send + Sync,
    {
        self.mutate(|documents| {
            let before = documents.len();
            documents.retain(|d| !predicate(d));
            let removed = before - documents.len();
            Ok(if removed > 0 {
                Mutation::changed(removed)
            } else {
                Mutation::unchanged(0)
            })
        })
        .await
    }

    pub async fn delete_by(&self, field: &str, value: &Value) -> StoreResult<usize> {
        self.delete_where(|d| d.field_equals(field, value)).await
    }

    async fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Vec<Document>) -> StoreResult<Mutation<T>>,
    {
        let _guard = self.write_lock.lock().await;

        let mut documents = self.engine.load(&self.name).await?;
        let Mutation { changed, output } = f(&mut documents)?;
        if changed {
            self.engine.persist(&self.name, &documents).await?;
        }

        Ok(output)
    }
}
