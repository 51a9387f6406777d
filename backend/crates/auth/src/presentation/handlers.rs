//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use kernel::id::UserId;
use platform::clock::Clock;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    AccountUseCase, AdminUseCase, AuthResolver, ChangePasswordInput, CurrentUser, SessionManager,
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, UpdateProfileInput,
};
use crate::domain::entity::Session;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;
use crate::presentation::cookie::{clear_auth_cookie, set_auth_cookie};
use crate::presentation::dto::{
    AuthResponse, ChangePasswordRequest, ChangePasswordResponse, SessionStatusResponse,
    SignInRequest, SignUpRequest, UpdateProfileRequest, UserResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<R> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R> Clone for AuthAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            clock,
        }
    }

    pub fn sessions(&self) -> SessionManager<R> {
        SessionManager::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.clock),
            self.config.session_ttl,
        )
    }

    pub fn resolver(&self) -> AuthResolver<R> {
        AuthResolver::new(
            Arc::clone(&self.repo),
            self.sessions(),
            self.config.session_cookie_name.clone(),
        )
    }

    fn account(&self) -> AccountUseCase<R> {
        AccountUseCase::new(Arc::clone(&self.repo), self.sessions(), Arc::clone(&self.clock))
    }

    fn admin(&self) -> AdminUseCase<R> {
        AdminUseCase::new(Arc::clone(&self.repo), self.sessions(), Arc::clone(&self.clock))
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.sessions(), state.clock.clone());

    let input = SignUpInput {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let output = use_case.execute(input).await?;

    session_response(
        &state.config,
        StatusCode::CREATED,
        UserResponse::from(&output.user),
        &output.session,
    )
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.sessions());

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    session_response(
        &state.config,
        StatusCode::OK,
        UserResponse::from(&output.user),
        &output.session,
    )
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name);

    if let Some(token) = token {
        let use_case = SignOutUseCase::new(state.sessions());
        // The cookie is cleared regardless
        if let Err(e) = use_case.execute(&token).await {
            tracing::warn!(error = %e, "Failed to delete session on sign-out");
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    clear_auth_cookie(&mut response, &state.config)?;
    Ok(response)
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: AuthStore,
{
    match state.resolver().current_user(&headers).await {
        Some(current) => Json(SessionStatusResponse {
            authenticated: true,
            user: Some(UserResponse::from(&current.user)),
            expires_at: Some(current.session.expires_at),
        }),
        None => Json(SessionStatusResponse {
            authenticated: false,
            user: None,
            expires_at: None,
        }),
    }
}

// ============================================================================
// Current User (requires authentication)
// ============================================================================

/// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&current.user))
}

/// PATCH /api/auth/me
pub async fn update_me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
{
    let input = UpdateProfileInput {
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let updated = state.account().update_profile(&current.user, input).await?;

    Ok(Json(UserResponse::from(&updated)))
}

/// POST /api/auth/me/password
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<Json<ChangePasswordResponse>>
where
    R: AuthStore,
{
    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    let revoked_sessions = state
        .account()
        .change_password(&current.user, &current.session.id, input)
        .await?;

    Ok(Json(ChangePasswordResponse { revoked_sessions }))
}

/// DELETE /api/auth/me
pub async fn delete_me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    state.account().delete_account(&current.user.id).await?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    clear_auth_cookie(&mut response, &state.config)?;
    Ok(response)
}

// ============================================================================
// Administration (requires admin role)
// ============================================================================

/// GET /api/auth/users
pub async fn list_users<R>(
    State(state): State<AuthAppState<R>>,
) -> AuthResult<Json<Vec<UserResponse>>>
where
    R: AuthStore,
{
    let users = state.admin().list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// DELETE /api/auth/users/{id}
pub async fn delete_user<R>(
    State(state): State<AuthAppState<R>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
{
    state
        .admin()
        .delete_user(&current.user, &UserId::from_string(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_response(
    config: &AuthConfig,
    status: StatusCode,
    user: UserResponse,
    session: &Session,
) -> AuthResult<Response> {
    let body = AuthResponse {
        user,
        expires_at: session.expires_at,
    };

    let mut response = (status, Json(body)).into_response();
    set_auth_cookie(&mut response, config, session.token.as_str(), session.expires_at)?;
    Ok(response)
}
