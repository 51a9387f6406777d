//! Document Store Repository Implementations
//!
//! Users live in `auth_users`, sessions in `sessions`. Both are plain
//! docstore collections; other features may read them but only this
//! module writes them.

use chrono::{DateTime, Utc};
use docstore::{Collection, Document, StorageEngine, StoreError, StoreRegistry};
use kernel::id::{SessionId, UserId};
use serde_json::Value;

use crate::domain::entity::{AuthUser, NewAuthUser, NewSession, Session, UserPatch};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, session_token::SessionToken};
use crate::error::{AuthError, AuthResult};

pub const USERS_COLLECTION: &str = "auth_users";
pub const SESSIONS_COLLECTION: &str = "sessions";

const EMAIL_FIELD: &str = "email";
const TOKEN_FIELD: &str = "token";
const USER_ID_FIELD: &str = "userId";
const EXPIRES_AT_FIELD: &str = "expiresAt";

/// Docstore-backed auth repository
pub struct DocumentAuthRepository<E> {
    users: Collection<E>,
    sessions: Collection<E>,
}

impl<E> Clone for DocumentAuthRepository<E> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<E> DocumentAuthRepository<E>
where
    E: StorageEngine + Send + Sync + 'static,
{
    pub fn new(registry: &StoreRegistry<E>) -> AuthResult<Self> {
        Ok(Self {
            users: registry.store(USERS_COLLECTION)?,
            sessions: registry.store(SESSIONS_COLLECTION)?,
        })
    }
}

fn str_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}

/// Sessions whose expiry cannot be read are treated as expired
fn expired_at(document: &Document, now: DateTime<Utc>) -> bool {
    str_field(document, EXPIRES_AT_FIELD)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .is_none_or(|expires_at| expires_at.with_timezone(&Utc) <= now)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl<E> UserRepository for DocumentAuthRepository<E>
where
    E: StorageEngine + Send + Sync + 'static,
{
    async fn insert_user(&self, user: NewAuthUser) -> AuthResult<AuthUser> {
        let fields = Document::encode_fields(&user)?;
        let email = user.email;

        // Rows written before emails were normalized may be mixed-case
        let document = match self
            .users
            .create_unique_by(EMAIL_FIELD, fields, |stored| {
                stored.as_str().is_some_and(|stored| email.matches(stored))
            })
            .await
        {
            Ok(document) => document,
            Err(StoreError::Conflict { .. }) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        Ok(document.decode()?)
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<AuthUser>> {
        match self.users.get(user_id.as_str()).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<AuthUser>> {
        let found = self
            .users
            .read()
            .await?
            .into_iter()
            .find(|d| str_field(d, EMAIL_FIELD).is_some_and(|stored| email.matches(stored)));

        match found {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> AuthResult<Vec<AuthUser>> {
        self.users
            .read()
            .await?
            .iter()
            .map(|d| d.decode().map_err(AuthError::from))
            .collect()
    }

    async fn update_user_fields(&self, user_id: &UserId, patch: UserPatch) -> AuthResult<AuthUser> {
        let fields = Document::encode_fields(&patch)?;

        match self.users.update(user_id.as_str(), fields).await {
            Ok(document) => Ok(document.decode()?),
            Err(StoreError::NotFound { .. }) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_user(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.users.delete(user_id.as_str()).await?)
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl<E> SessionRepository for DocumentAuthRepository<E>
where
    E: StorageEngine + Send + Sync + 'static,
{
    async fn insert_session(&self, session: NewSession) -> AuthResult<Session> {
        let fields = Document::encode_fields(&session)?;
        let document = self.sessions.create(fields).await?;
        Ok(document.decode()?)
    }

    async fn find_session_by_token(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
        let found = self
            .sessions
            .read()
            .await?
            .into_iter()
            .find(|d| str_field(d, TOKEN_FIELD).is_some_and(|stored| token.matches(stored)));

        match found {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    async fn delete_session_by_token(&self, token: &SessionToken) -> AuthResult<bool> {
        let deleted = self
            .sessions
            .delete_where(|d| str_field(d, TOKEN_FIELD).is_some_and(|stored| token.matches(stored)))
            .await?;
        Ok(deleted > 0)
    }

    async fn delete_sessions_for_user(
        &self,
        user_id: &UserId,
        except: Option<&SessionId>,
    ) -> AuthResult<usize> {
        let deleted = self
            .sessions
            .delete_where(|d| {
                str_field(d, USER_ID_FIELD) == Some(user_id.as_str())
                    && except.is_none_or(|keep| d.id() != keep.as_str())
            })
            .await?;
        Ok(deleted)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AuthResult<usize> {
        Ok(self.sessions.delete_where(|d| expired_at(d, now)).await?)
    }
}
