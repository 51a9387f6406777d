//! Session Entity
//!
//! One record in the `sessions` collection. A session is valid while
//! `now < expires_at`; revocation is deletion. Nothing ever extends or
//! revives a session.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::session_token::SessionToken;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Fields for a session that has not been stored yet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_id: UserId,
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewSession {
    /// Fresh token, expiring `ttl` after `now`. Fails if the expiry falls
    /// outside the representable date range.
    pub fn issue(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> AuthResult<Self> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::Internal(format!("session lifetime {ttl} is out of range"))
        })?;

        Ok(Self {
            user_id,
            token: SessionToken::generate(),
            expires_at,
            created_at: now,
        })
    }
}
