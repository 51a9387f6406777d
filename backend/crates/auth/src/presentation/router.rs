//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_admin, require_auth};

/// Create the Auth router, to be nested under `/api/auth`
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let account = Router::new()
        .route(
            "/me",
            get(handlers::me)
                .patch(handlers::update_me::<R>)
                .delete(handlers::delete_me::<R>),
        )
        .route("/me/password", post(handlers::change_password::<R>))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<R>));

    let admin = Router::new()
        .route("/users", get(handlers::list_users::<R>))
        .route("/users/{id}", delete(handlers::delete_user::<R>))
        .route_layer(from_fn_with_state(state.clone(), require_admin::<R>));

    Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/signin", post(handlers::sign_in::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/status", get(handlers::session_status::<R>))
        .merge(account)
        .merge(admin)
        .with_state(state)
}
