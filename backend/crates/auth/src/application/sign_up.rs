//! Sign Up Use Case
//!
//! Creates a new user account and signs it in.

use std::sync::Arc;

use platform::clock::Clock;
use platform::password::ClearTextPassword;

use crate::application::credentials;
use crate::application::session::SessionManager;
use crate::domain::entity::auth_user::normalize_name;
use crate::domain::entity::{AuthUser, NewAuthUser, Session};
use crate::domain::repository::{AuthStore, UserRepository};
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Sign up output
pub struct SignUpOutput {
    pub user: AuthUser,
    pub session: Session,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    sessions: SessionManager<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SignUpUseCase<R>
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

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(&input.email)?;
        let password = ClearTextPassword::new(input.password)?;
        let first_name = normalize_name(&input.first_name)
            .ok_or_else(|| AuthError::Validation("First name is too long".to_string()))?;
        let last_name = normalize_name(&input.last_name)
            .ok_or_else(|| AuthError::Validation("Last name is too long".to_string()))?;

        // Cheap early exit; insert_user re-checks under the collection lock.
        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = credentials::hash_password(password).await?;

        let user = self
            .repo
            .insert_user(NewAuthUser::new(
                email,
                password_hash,
                UserRole::User,
                first_name,
                last_name,
                self.clock.now(),
            ))
            .await?;

        let session = self.sessions.create_session(&user.id).await?;

        tracing::info!(user_id = %user.id, "User signed up");

        Ok(SignUpOutput { user, session })
    }
}
