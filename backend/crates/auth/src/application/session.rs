//! Session Manager
//!
//! Issues, validates and revokes opaque session tokens.
//!
//! Lifecycle: Active until `expires_at`, then Expired; Deleted on sign-out,
//! revocation or purge. An expired session stays stored and inert until
//! [`SessionManager::purge_expired`] removes it. A session never moves back
//! to Active and its expiry is never extended.

use std::sync::Arc;

use chrono::Duration;
use kernel::id::{SessionId, UserId};
use platform::clock::Clock;

use crate::domain::entity::{NewSession, Session};
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::session_token::SessionToken;
use crate::error::AuthResult;

pub struct SessionManager<S> {
    repo: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
        }
    }
}

impl<S> SessionManager<S>
where
    S: SessionRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { repo, clock, ttl }
    }

    /// Issue a new session for `user_id`
    pub async fn create_session(&self, user_id: &UserId) -> AuthResult<Session> {
        let issued = NewSession::issue(user_id.clone(), self.clock.now(), self.ttl)?;
        let session = self.repo.insert_session(issued).await?;

        tracing::debug!(
            user_id = %session.user_id,
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Session created"
        );

        Ok(session)
    }

    /// The live session for `token`, or `None` if it is unknown or expired.
    /// Read-only: expired records are left for the purge.
    pub async fn validate_session(&self, token: &str) -> AuthResult<Option<Session>> {
        let Some(token) = SessionToken::from_presented(token) else {
            return Ok(None);
        };

        let Some(session) = self.repo.find_session_by_token(&token).await? else {
            return Ok(None);
        };

        if session.is_expired(self.clock.now()) {
            tracing::debug!(session_id = %session.id, "Expired session presented");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Revoke one session. Unknown tokens are not an error.
    pub async fn delete_session(&self, token: &str) -> AuthResult<bool> {
        let Some(token) = SessionToken::from_presented(token) else {
            return Ok(false);
        };
        self.repo.delete_session_by_token(&token).await
    }

    /// Revoke every session of `user_id`, optionally sparing one
    pub async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&SessionId>,
    ) -> AuthResult<usize> {
        let deleted = self.repo.delete_sessions_for_user(user_id, except).await?;

        if deleted > 0 {
            tracing::info!(user_id = %user_id, count = deleted, "Sessions revoked");
        }

        Ok(deleted)
    }

    /// Remove all expired sessions from storage
    pub async fn purge_expired(&self) -> AuthResult<usize> {
        let purged = self.repo.delete_expired_sessions(self.clock.now()).await?;

        tracing::info!(count = purged, "Purged expired sessions");

        Ok(purged)
    }
}
