//! Account Use Case
//!
//! Self-service changes to the signed-in user's own account.

use std::sync::Arc;

use kernel::id::{SessionId, UserId};
use platform::clock::Clock;
use platform::password::ClearTextPassword;

use crate::application::credentials;
use crate::application::session::SessionManager;
use crate::domain::entity::{AuthUser, UserPatch};
use crate::domain::entity::auth_user::normalize_name;
use crate::domain::repository::{AuthStore, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Profile update input; `None` leaves a field unchanged
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Password change input
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Account use case
pub struct AccountUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    sessions: SessionManager<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AccountUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, sessions: SessionManager<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            sessions,
            clock,
        }
    }

    pub async fn update_profile(
        &self,
        user: &AuthUser,
        input: UpdateProfileInput,
    ) -> AuthResult<AuthUser> {
        let first_name = input
            .first_name
            .map(|name| {
                normalize_name(&name)
                    .ok_or_else(|| AuthError::Validation("First name is too long".to_string()))
            })
            .transpose()?;
        let last_name = input
            .last_name
            .map(|name| {
                normalize_name(&name)
                    .ok_or_else(|| AuthError::Validation("Last name is too long".to_string()))
            })
            .transpose()?;

        let patch = UserPatch::names(first_name, last_name, self.clock.now());
        let updated = self.repo.update_user_fields(&user.id, patch).await?;

        tracing::info!(user_id = %updated.id, "Profile updated");

        Ok(updated)
    }

    /// Re-hash the password and revoke every other session of the user.
    /// Returns how many sessions were revoked.
    pub async fn change_password(
        &self,
        user: &AuthUser,
        current_session: &SessionId,
        input: ChangePasswordInput,
    ) -> AuthResult<usize> {
        let current = ClearTextPassword::for_verification(input.current_password);
        let new_password = ClearTextPassword::new(input.new_password)?;

        if !credentials::verify_password(user.password_hash.clone(), current).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = credentials::hash_password(new_password).await?;

        self.repo
            .update_user_fields(&user.id, UserPatch::password_hash(password_hash, self.clock.now()))
            .await?;

        let revoked = self
            .sessions
            .delete_all_for_user(&user.id, Some(current_session))
            .await?;

        tracing::info!(user_id = %user.id, revoked_sessions = revoked, "Password changed");

        Ok(revoked)
    }

    /// Delete all sessions of the user, then the user. Returns whether the
    /// user existed.
    pub async fn delete_account(&self, user_id: &UserId) -> AuthResult<bool> {
        self.sessions.delete_all_for_user(user_id, None).await?;
        let deleted = self.repo.delete_user(user_id).await?;

        if deleted {
            tracing::info!(user_id = %user_id, "Account deleted");
        }

        Ok(deleted)
    }
}
