//! Entity Module

pub mod auth_session;
pub mod auth_user;

pub use auth_session::{NewSession, Session};
pub use auth_user::{AuthUser, NewAuthUser, UserPatch};
