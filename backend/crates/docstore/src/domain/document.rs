//! Document
//!
//! A schema-free JSON object with a mandatory string `id`. Field order is
//! preserved as written. Typed views are obtained with [`Document::decode`]
//! and written back with [`Document::encode_fields`].

use chrono::{DateTime, SecondsFormat, Utc};
use kernel::id::DocumentId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Build a new document from caller fields.
    ///
    /// The generated id always replaces any caller-supplied `id`; missing
    /// `createdAt` / `updatedAt` are stamped with `now`.
    pub(crate) fn create(fields: Value, now: DateTime<Utc>) -> StoreResult<Self> {
        let fields = into_object(fields)?;

        let mut map = Map::with_capacity(fields.len() + 3);
        map.insert(
            ID_FIELD.to_string(),
            Value::String(DocumentId::new().into_string()),
        );
        for (key, value) in fields {
            if key != ID_FIELD {
                map.insert(key, value);
            }
        }

        let stamp = Value::String(timestamp(now));
        map.entry(CREATED_AT_FIELD).or_insert_with(|| stamp.clone());
        map.entry(UPDATED_AT_FIELD).or_insert(stamp);

        Ok(Self(map))
    }

    /// Check the shape of a document read back from storage
    pub(crate) fn validate_stored(&self) -> Result<(), String> {
        match self.0.get(ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => Ok(()),
            Some(_) => Err("document id is not a non-empty string".to_string()),
            None => Err("document without id".to_string()),
        }
    }

    pub fn id(&self) -> &str {
        self.0
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Exact JSON equality on one field. A missing field never matches.
    pub fn field_equals(&self, field: &str, value: &Value) -> bool {
        self.0.get(field) == Some(value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Shallow merge: patch keys overwrite, everything else is kept.
    ///
    /// `id` is immutable and ignored in patches. `updatedAt` is refreshed
    /// unless the patch sets it.
    pub(crate) fn merge(&mut self, patch: Map<String, Value>, now: DateTime<Utc>) {
        let sets_updated_at = patch.contains_key(UPDATED_AT_FIELD);
        for (key, value) in patch {
            if key != ID_FIELD {
                self.0.insert(key, value);
            }
        }
        if !sets_updated_at {
            self.0
                .insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp(now)));
        }
    }

    /// Deserialize into a typed view
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(StoreError::Decode)
    }

    /// Serialize a typed value into fields suitable for create/update
    pub fn encode_fields<T: Serialize>(value: &T) -> StoreResult<Value> {
        let value =
            serde_json::to_value(value).map_err(|e| StoreError::Validation(e.to_string()))?;
        if !value.is_object() {
            return Err(StoreError::Validation(
                "value does not serialize to a JSON object".to_string(),
            ));
        }
        Ok(value)
    }
}

pub(crate) fn into_object(value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Validation(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
