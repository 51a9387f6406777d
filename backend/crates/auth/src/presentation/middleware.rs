//! Auth Middleware
//!
//! Guards for protected routes. Both resolve the session cookie and, on
//! success, put a [`CurrentUser`] into the request extensions for handlers.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::CurrentUser;
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Header set on 401 responses so clients can tell "sign in" apart from
/// other failures
pub const AUTH_REQUIRED_HEADER: &str = "X-Auth-Required";

/// Middleware that requires a valid session
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
{
    let headers = req.headers().clone();
    let current = resolve(&state, &headers).await?;

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

/// Middleware that requires a valid session of an admin user
pub async fn require_admin<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
{
    let headers = req.headers().clone();
    let current = resolve(&state, &headers).await?;

    if !current.user.is_admin() {
        tracing::warn!(user_id = %current.user.id, "Non-admin user denied admin route");
        return Err(AuthError::Forbidden.into_response());
    }

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

// Takes a copy of the headers: the request body is not `Sync`, so no borrow
// of the request may be held across an await.
async fn resolve<R>(state: &AuthAppState<R>, headers: &HeaderMap) -> Result<CurrentUser, Response>
where
    R: AuthStore,
{
    match state.resolver().current_user(headers).await {
        Some(current) => Ok(current),
        None => {
            let mut response = AuthError::Unauthenticated.into_response();
            response
                .headers_mut()
                .insert(AUTH_REQUIRED_HEADER, HeaderValue::from_static("true"));
            Err(response)
        }
    }
}
