//! Sign In Use Case
//!
//! Authenticates a user by email and password and creates a session.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::credentials;
use crate::application::session::SessionManager;
use crate::domain::entity::{AuthUser, Session};
use crate::domain::repository::{AuthStore, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
pub struct SignInOutput {
    pub user: AuthUser,
    pub session: Session,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    sessions: SessionManager<R>,
}

impl<R> SignInUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, sessions: SessionManager<R>) -> Self {
        Self { repo, sessions }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let password = ClearTextPassword::for_verification(input.password);

        // An address that cannot be registered cannot sign in either; it
        // gets the same answer, and the same cost, as an unknown one.
        let user = match Email::new(&input.email) {
            Ok(email) => self.repo.find_user_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            credentials::verify_against_dummy(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !credentials::verify_password(user.password_hash.clone(), password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.create_session(&user.id).await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.id,
            "User signed in"
        );

        Ok(SignInOutput { user, session })
    }
}
