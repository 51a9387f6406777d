//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod admin;
pub mod config;
pub mod credentials;
pub mod resolver;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use account::{AccountUseCase, ChangePasswordInput, UpdateProfileInput};
pub use admin::AdminUseCase;
pub use config::AuthConfig;
pub use resolver::{AuthResolver, CurrentUser};
pub use session::SessionManager;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
