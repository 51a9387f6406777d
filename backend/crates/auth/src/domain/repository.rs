//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{AuthUser, NewAuthUser, NewSession, Session, UserPatch};
use crate::domain::value_object::{email::Email, session_token::SessionToken};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Store a new user. Fails with `EmailTaken` if the email is in use.
    async fn insert_user(&self, user: NewAuthUser) -> AuthResult<AuthUser>;

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<AuthUser>>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<AuthUser>>;

    async fn list_users(&self) -> AuthResult<Vec<AuthUser>>;

    /// Apply `patch` to the stored user and return the result. Fields the
    /// patch does not carry are left as stored. Fails with `UserNotFound`
    /// if the user is gone.
    async fn update_user_fields(&self, user_id: &UserId, patch: UserPatch) -> AuthResult<AuthUser>;

    async fn delete_user(&self, user_id: &UserId) -> AuthResult<bool>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn insert_session(&self, session: NewSession) -> AuthResult<Session>;

    /// Exact token match, compared in constant time
    async fn find_session_by_token(&self, token: &SessionToken) -> AuthResult<Option<Session>>;

    async fn delete_session_by_token(&self, token: &SessionToken) -> AuthResult<bool>;

    /// Delete all sessions for a user (except `except`, if given)
    async fn delete_sessions_for_user(
        &self,
        user_id: &UserId,
        except: Option<&SessionId>,
    ) -> AuthResult<usize>;

    /// Delete every session with `expires_at <= now`
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AuthResult<usize>;
}

/// Everything the auth layer needs from storage, in one bound
pub trait AuthStore: UserRepository + SessionRepository + Send + Sync + 'static {}

impl<T> AuthStore for T where T: UserRepository + SessionRepository + Send + Sync + 'static {}
