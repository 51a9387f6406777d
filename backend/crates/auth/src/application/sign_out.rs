//! Sign Out Use Case
//!
//! Invalidates a user session.

use crate::application::session::SessionManager;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: AuthStore,
{
    sessions: SessionManager<R>,
}

impl<R> SignOutUseCase<R>
where
    R: AuthStore,
{
    pub fn new(sessions: SessionManager<R>) -> Self {
        Self { sessions }
    }

    /// Sign out from the session behind `session_token`. Signing out twice,
    /// or with a token that never existed, succeeds.
    pub async fn execute(&self, session_token: &str) -> AuthResult<()> {
        if self.sessions.delete_session(session_token).await? {
            tracing::info!("User signed out");
        }
        Ok(())
    }
}
