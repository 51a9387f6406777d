//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, cookies and middleware.

pub mod cookie;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use cookie::{clear_auth_cookie, set_auth_cookie};
pub use handlers::AuthAppState;
pub use middleware::{require_admin, require_auth};
pub use router::auth_router;
