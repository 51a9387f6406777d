//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, session manager, request resolver
//! - `infra/` - Document store implementations
//! - `presentation/` - HTTP handlers, DTOs, router, cookies
//!
//! ## Features
//! - Email + password sign-up / sign-in
//! - Server-side sessions behind an opaque `sp_session` cookie
//! - Profile and password changes, account deletion
//! - Two roles (`user`, `admin`) with an admin route guard
//!
//! ## Security Model
//! - Passwords hashed with PBKDF2-HMAC-SHA512, 120k iterations, random salt
//! - Session tokens are 256-bit random values, compared in constant time
//! - Sessions expire at a fixed time and are never extended
//! - Unknown email and wrong password are indistinguishable, in both
//!   response and timing
//! - Changing the password signs out every other session

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::{AuthResolver, CurrentUser, SessionManager};
pub use domain::entity::{AuthUser, Session};
pub use error::{AuthError, AuthResult};
pub use infra::document::DocumentAuthRepository;
pub use presentation::router::auth_router;
pub use presentation::{AuthAppState, clear_auth_cookie, set_auth_cookie};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
