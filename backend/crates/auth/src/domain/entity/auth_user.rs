//! Auth User Entity
//!
//! One record in the `auth_users` collection. Field names are the persisted
//! camelCase names; unknown fields written by other features are ignored
//! on read and left alone on update.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{email::Email, user_role::UserRole};

/// Upper bound on first/last name length, in code points
pub const NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
    pub password_hash: HashedPassword,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Fields for a user that has not been stored yet; the store assigns `id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthUser {
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewAuthUser {
    pub fn new(
        email: Email,
        password_hash: HashedPassword,
        role: UserRole,
        first_name: String,
        last_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            password_hash,
            role,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The fields one user change touches. Only these are written, so
/// concurrent changes to other fields of the same user are kept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<HashedPassword>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    pub updated_at: DateTime<Utc>,
}

impl UserPatch {
    /// `None` leaves a name unchanged
    pub fn names(first_name: Option<String>, last_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            first_name,
            last_name,
            ..Self::touch(now)
        }
    }

    pub fn password_hash(password_hash: HashedPassword, now: DateTime<Utc>) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Self::touch(now)
        }
    }

    pub fn role(role: UserRole, now: DateTime<Utc>) -> Self {
        Self {
            role: Some(role),
            ..Self::touch(now)
        }
    }

    fn touch(now: DateTime<Utc>) -> Self {
        Self {
            first_name: None,
            last_name: None,
            password_hash: None,
            role: None,
            updated_at: now,
        }
    }
}

/// Trim a display name and enforce [`NAME_MAX_LENGTH`]
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.chars().count() <= NAME_MAX_LENGTH).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_tolerates_missing_optional_fields() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.io",
            "passwordHash": "pbkdf2$120000$sha512$00$00",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z",
            "legacyField": 1
        }))
        .unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.first_name, "");
    }

    #[test]
    fn test_serialized_shape() {
        let user = NewAuthUser::new(
            Email::new("a@b.io").unwrap(),
            HashedPassword::parse(platform::password::DUMMY_HASH).unwrap(),
            UserRole::Admin,
            "Ada".into(),
            "Lovelace".into(),
            Utc::now(),
        );
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["email"], json!("a@b.io"));
        assert_eq!(value["role"], json!("admin"));
        assert_eq!(value["firstName"], json!("Ada"));
        assert!(value.get("passwordHash").is_some());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_patch_serializes_only_touched_fields() {
        let now = Utc::now();
        let value = serde_json::to_value(UserPatch::names(None, Some("Byron".into()), now)).unwrap();
        let fields = value.as_object().unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(value["lastName"], json!("Byron"));
        assert!(value["updatedAt"].is_string());

        let value = serde_json::to_value(UserPatch::role(UserRole::Admin, now)).unwrap();
        assert_eq!(value["role"], json!("admin"));
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("firstName").is_none());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Ada "), Some("Ada".to_string()));
        assert_eq!(normalize_name(""), Some(String::new()));
        assert_eq!(normalize_name(&"x".repeat(NAME_MAX_LENGTH + 1)), None);
    }
}
