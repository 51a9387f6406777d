//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docstore::StoreError;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordPolicyError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No usable session on a route that needs one
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but the role does not allow this
    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    /// Malformed input
    #[error("{0}")]
    Validation(String),

    #[error("Password validation failed: {0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    /// Document store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                ErrorKind::Unauthorized
            }
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Validation(_) | AuthError::PasswordPolicy(_) => ErrorKind::BadRequest,
            AuthError::Storage(e) => e.kind(),
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError. Server-side details stay out of the public
    /// message; see [`AppError::public_message`].
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Storage(e) if e.is_storage_failure() => {
                tracing::error!(error = %e, "Auth storage error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}
