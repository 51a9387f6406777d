//! Common ID Types
//!
//! Documents are keyed by opaque strings. New ids are UUID v4 in their
//! hyphenated text form, but ids loaded from disk are accepted verbatim so
//! older records with other id shapes keep working.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Generic typed ID wrapper over an opaque string
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type UserId = Id<markers::User>;
///
/// let id = UserId::new();
/// assert_eq!(id.as_str().len(), 36);
/// ```
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Generate a fresh random ID (UUID v4)
    pub fn new() -> Self {
        Self::from_string(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id as read from storage or a request
    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// Reinterpret the same id under another marker.
    ///
    /// A document id becomes a user id once the document is known to live
    /// in the users collection.
    pub fn cast<U>(self) -> Id<U> {
        Id::from_string(self.value)
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_string(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_string)
    }
}

/// Marker types for different entity IDs
pub mod markers {
    /// Any stored document
    pub struct Document;

    /// Account in `auth_users`
    pub struct User;

    /// Session in `sessions`
    pub struct Session;
}

pub type DocumentId = Id<markers::Document>;
pub type UserId = Id<markers::User>;
pub type SessionId = Id<markers::Session>;
