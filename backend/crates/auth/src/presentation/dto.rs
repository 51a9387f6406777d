//! API DTOs (Data Transfer Objects)
//!
//! Request types that carry passwords deliberately do not derive `Debug`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::AuthUser;

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Sign up / sign in response. The token itself only travels in the cookie.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user: Option<UserResponse>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Account
// ============================================================================

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Password change request
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    /// Other sessions of the user that were signed out
    pub revoked_sessions: usize,
}

// ============================================================================
// User Info
// ============================================================================

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AuthUser> for UserResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            role: user.role.code().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
