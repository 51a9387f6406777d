//! Auth Resolver
//!
//! Maps an incoming request to the signed-in user. Every unauthenticated
//! outcome is `None`: no cookie, a stale or unknown token, a session whose
//! user has been deleted, and storage failures (logged, then treated as
//! signed out).

use std::sync::Arc;

use axum::http::HeaderMap;
use platform::cookie::extract_cookie;

use crate::application::session::SessionManager;
use crate::domain::entity::{AuthUser, Session};
use crate::domain::repository::{AuthStore, UserRepository};
use crate::error::AuthResult;

/// The signed-in user together with the session that proved it.
/// Inserted into request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub session: Session,
}

pub struct AuthResolver<R> {
    repo: Arc<R>,
    sessions: SessionManager<R>,
    cookie_name: String,
}

impl<R> AuthResolver<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, sessions: SessionManager<R>, cookie_name: impl Into<String>) -> Self {
        Self {
            repo,
            sessions,
            cookie_name: cookie_name.into(),
        }
    }

    /// Resolve a raw token to its user and session
    pub async fn authenticate(&self, token: &str) -> AuthResult<Option<CurrentUser>> {
        let Some(session) = self.sessions.validate_session(token).await? else {
            return Ok(None);
        };

        let Some(user) = self.repo.find_user_by_id(&session.user_id).await? else {
            tracing::debug!(session_id = %session.id, "Session refers to a missing user");
            return Ok(None);
        };

        Ok(Some(CurrentUser { user, session }))
    }

    /// Resolve the session cookie in `headers`
    pub async fn current_user(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        let token = extract_cookie(headers, &self.cookie_name)?;

        match self.authenticate(&token).await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve session; treating request as signed out");
                None
            }
        }
    }

    pub async fn get_auth_user_from_request(&self, headers: &HeaderMap) -> Option<AuthUser> {
        self.current_user(headers).await.map(|current| current.user)
    }
}
