//! Admin Use Case
//!
//! User administration. Callers are expected to have passed the admin
//! guard already; nothing here re-checks the actor's role.

use std::sync::Arc;

use kernel::id::UserId;
use platform::clock::Clock;
use platform::password::ClearTextPassword;

use crate::application::account::AccountUseCase;
use crate::application::credentials;
use crate::application::session::SessionManager;
use crate::domain::entity::{AuthUser, NewAuthUser, UserPatch};
use crate::domain::repository::{AuthStore, UserRepository};
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Admin use case
pub struct AdminUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    sessions: SessionManager<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AdminUseCase<R>
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

    pub async fn list_users(&self) -> AuthResult<Vec<AuthUser>> {
        self.repo.list_users().await
    }

    /// Delete another user's account and sessions
    pub async fn delete_user(&self, actor: &AuthUser, target: &UserId) -> AuthResult<()> {
        let account = AccountUseCase::new(
            Arc::clone(&self.repo),
            self.sessions.clone(),
            Arc::clone(&self.clock),
        );

        if !account.delete_account(target).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(actor = %actor.id, user_id = %target, "User deleted by admin");
        Ok(())
    }

    /// Make sure an admin account exists for `email`.
    ///
    /// Creates it with `password` when missing. An existing account is
    /// promoted if needed; its password is left alone.
    pub async fn ensure_admin(&self, email: &str, password: String) -> AuthResult<AuthUser> {
        let email = Email::new(email)?;

        if let Some(user) = self.repo.find_user_by_email(&email).await? {
            if user.is_admin() {
                return Ok(user);
            }
            let user = self
                .repo
                .update_user_fields(&user.id, UserPatch::role(UserRole::Admin, self.clock.now()))
                .await?;
            tracing::info!(user_id = %user.id, "Existing user promoted to admin");
            return Ok(user);
        }

        let password = ClearTextPassword::new(password)?;
        let password_hash = credentials::hash_password(password).await?;

        let user = self
            .repo
            .insert_user(NewAuthUser::new(
                email,
                password_hash,
                UserRole::Admin,
                String::new(),
                String::new(),
                self.clock.now(),
            ))
            .await?;

        tracing::info!(user_id = %user.id, "Admin account created");
        Ok(user)
    }
}
