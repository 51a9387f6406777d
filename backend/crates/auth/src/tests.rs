use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, header};
use chrono::Duration;
use docstore::{MemoryEngine, StoreRegistry};
use platform::clock::{Clock, ManualClock};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::application::{
    AccountUseCase, AdminUseCase, ChangePasswordInput, SignInInput, SignInUseCase, SignUpInput,
    SignUpOutput, SignUpUseCase, UpdateProfileInput,
};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::{AuthAppState, AuthConfig, AuthError, DocumentAuthRepository, SessionManager, auth_router};

type Repo = DocumentAuthRepository<MemoryEngine>;

const PASSWORD: &str = "correct horse battery";

struct Harness {
    state: AuthAppState<Repo>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let registry = StoreRegistry::in_memory();
        let repo = DocumentAuthRepository::new(&registry).expect("repository");
        let clock = Arc::new(ManualClock::starting_now());
        let config = AuthConfig::development().with_session_ttl(Duration::hours(1));
        let state = AuthAppState::new(repo, config, clock.clone() as Arc<dyn Clock>);
        Self { state, clock }
    }

    fn dyn_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    async fn sign_up(&self, email: &str) -> SignUpOutput {
        SignUpUseCase::new(self.state.repo.clone(), self.state.sessions(), self.dyn_clock())
            .execute(SignUpInput {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .expect("sign up")
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<crate::application::SignInOutput, AuthError> {
        SignInUseCase::new(self.state.repo.clone(), self.state.sessions())
            .execute(SignInInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    fn account(&self) -> AccountUseCase<Repo> {
        AccountUseCase::new(self.state.repo.clone(), self.state.sessions(), self.dyn_clock())
    }

    fn admin(&self) -> AdminUseCase<Repo> {
        AdminUseCase::new(self.state.repo.clone(), self.state.sessions(), self.dyn_clock())
    }

    fn router(&self) -> Router {
        auth_router(self.state.clone())
    }
}

fn cookie_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; sp_session={token}")).expect("header"),
    );
    headers
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// `name=value` part of the first Set-Cookie header
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .expect("ascii");
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

// ============================================================================
// Resolver
// ============================================================================

#[tokio::test]
async fn test_resolver_follows_session_lifetime() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let token = signed_up.session.token.as_str().to_string();
    let resolver = h.state.resolver();

    let current = resolver
        .current_user(&cookie_headers(&token))
        .await
        .expect("live session resolves");
    assert_eq!(current.user.id, signed_up.user.id);
    assert_eq!(current.session.id, signed_up.session.id);

    h.clock.advance(Duration::minutes(59));
    assert!(resolver.current_user(&cookie_headers(&token)).await.is_some());

    h.clock.advance(Duration::minutes(2));
    assert!(resolver.current_user(&cookie_headers(&token)).await.is_none());
}

#[tokio::test]
async fn test_expired_session_stays_stored_until_purge() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let token = signed_up.session.token.clone();
    let sessions = h.state.sessions();

    h.clock.advance(Duration::hours(2));
    assert!(sessions.validate_session(token.as_str()).await.expect("validate").is_none());

    let stored = h.state.repo.find_session_by_token(&token).await.expect("find");
    assert_eq!(stored.map(|s| s.id), Some(signed_up.session.id));

    assert_eq!(sessions.purge_expired().await.expect("purge"), 1);
    assert!(h.state.repo.find_session_by_token(&token).await.expect("find").is_none());
}

#[tokio::test]
async fn test_out_of_range_session_lifetime_is_an_error() {
    let h = Harness::new();
    let user = h.sign_up("ada@example.com").await.user;

    let sessions = SessionManager::new(
        h.state.repo.clone(),
        h.dyn_clock(),
        Duration::hours(3_000_000_000),
    );
    let err = sessions.create_session(&user.id).await.err().expect("overflow");
    assert!(matches!(err, AuthError::Internal(_)));
}

#[tokio::test]
async fn test_resolver_rejects_missing_and_unknown_tokens() {
    let h = Harness::new();
    h.sign_up("ada@example.com").await;
    let resolver = h.state.resolver();

    assert!(resolver.current_user(&HeaderMap::new()).await.is_none());
    assert!(resolver.current_user(&cookie_headers("garbage")).await.is_none());
    assert!(
        resolver
            .current_user(&cookie_headers(&"a".repeat(64)))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_resolver_after_sign_out_and_user_deletion() {
    let h = Harness::new();
    let first = h.sign_up("ada@example.com").await;
    let second = h.sign_in("ada@example.com", PASSWORD).await.expect("sign in");
    let resolver = h.state.resolver();

    assert!(h.state.sessions().delete_session(first.session.token.as_str()).await.expect("delete"));
    assert!(
        resolver
            .current_user(&cookie_headers(first.session.token.as_str()))
            .await
            .is_none()
    );

    // A session whose user vanished resolves to nobody
    assert!(h.state.repo.delete_user(&first.user.id).await.expect("delete user"));
    assert!(
        resolver
            .authenticate(second.session.token.as_str())
            .await
            .expect("authenticate")
            .is_none()
    );
}

// ============================================================================
// Sign Up / Sign In
// ============================================================================

#[tokio::test]
async fn test_sign_up_normalizes_email_and_rejects_duplicates() {
    let h = Harness::new();
    let signed_up = h.sign_up("  Ada@Example.COM ").await;
    assert_eq!(signed_up.user.email.as_str(), "ada@example.com");
    assert!(!signed_up.user.is_admin());
    assert_ne!(signed_up.user.password_hash.as_str(), PASSWORD);

    let err = SignUpUseCase::new(h.state.repo.clone(), h.state.sessions(), h.dyn_clock())
        .execute(SignUpInput {
            email: "ADA@example.com".to_string(),
            password: PASSWORD.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .err()
        .expect("duplicate email");
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
async fn test_sign_up_rejects_short_password() {
    let h = Harness::new();
    let err = SignUpUseCase::new(h.state.repo.clone(), h.state.sessions(), h.dyn_clock())
        .execute(SignUpInput {
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .err()
        .expect("weak password");
    assert!(matches!(err, AuthError::PasswordPolicy(_)));

    let email = Email::new("ada@example.com").expect("email");
    assert!(h.state.repo.find_user_by_email(&email).await.expect("find").is_none());
}

#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() {
    let h = Harness::new();
    h.sign_up("ada@example.com").await;

    let wrong_password = h.sign_in("ada@example.com", "not the password").await.err().expect("wrong password");
    let unknown_email = h.sign_in("nobody@example.com", PASSWORD).await.err().expect("unknown email");
    let malformed = h.sign_in("not-an-email", PASSWORD).await.err().expect("malformed email");

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    assert!(matches!(malformed, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());

    let signed_in = h.sign_in("ADA@example.com", PASSWORD).await.expect("sign in");
    assert_eq!(signed_in.user.email.as_str(), "ada@example.com");
}

// ============================================================================
// Account
// ============================================================================

#[tokio::test]
async fn test_change_password_revokes_other_sessions() {
    let h = Harness::new();
    let current = h.sign_up("ada@example.com").await;
    let other = h.sign_in("ada@example.com", PASSWORD).await.expect("sign in");
    let resolver = h.state.resolver();

    let err = h
        .account()
        .change_password(
            &current.user,
            &current.session.id,
            ChangePasswordInput {
                current_password: "not the password".to_string(),
                new_password: "a brand new secret".to_string(),
            },
        )
        .await
        .err()
        .expect("wrong current password");
    assert!(matches!(err, AuthError::InvalidCredentials));

    let revoked = h
        .account()
        .change_password(
            &current.user,
            &current.session.id,
            ChangePasswordInput {
                current_password: PASSWORD.to_string(),
                new_password: "a brand new secret".to_string(),
            },
        )
        .await
        .expect("change password");
    assert_eq!(revoked, 1);

    assert!(resolver.authenticate(current.session.token.as_str()).await.expect("auth").is_some());
    assert!(resolver.authenticate(other.session.token.as_str()).await.expect("auth").is_none());

    assert!(h.sign_in("ada@example.com", PASSWORD).await.is_err());
    assert!(h.sign_in("ada@example.com", "a brand new secret").await.is_ok());
}

#[tokio::test]
async fn test_profile_update_from_stale_snapshot_keeps_new_password() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let stale = signed_up.user.clone();

    h.account()
        .change_password(
            &signed_up.user,
            &signed_up.session.id,
            ChangePasswordInput {
                current_password: PASSWORD.to_string(),
                new_password: "brand new password".to_string(),
            },
        )
        .await
        .expect("change password");

    let updated = h
        .account()
        .update_profile(
            &stale,
            UpdateProfileInput {
                first_name: Some("Grace".to_string()),
                last_name: None,
            },
        )
        .await
        .expect("update profile");
    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.last_name, "Lovelace");
    assert_ne!(updated.password_hash.as_str(), stale.password_hash.as_str());

    assert!(h.sign_in("ada@example.com", PASSWORD).await.is_err());
    assert!(h.sign_in("ada@example.com", "brand new password").await.is_ok());
}

#[tokio::test]
async fn test_promotion_from_stale_snapshot_keeps_profile() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;

    h.account()
        .update_profile(
            &signed_up.user,
            UpdateProfileInput {
                first_name: None,
                last_name: Some("Byron".to_string()),
            },
        )
        .await
        .expect("update profile");

    let promoted = h
        .admin()
        .ensure_admin("ada@example.com", "ignored password".to_string())
        .await
        .expect("promote");
    assert!(promoted.is_admin());
    assert_eq!(promoted.last_name, "Byron");
}

#[tokio::test]
async fn test_delete_account_removes_sessions() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let other_user = h.sign_up("grace@example.com").await;

    assert!(h.account().delete_account(&signed_up.user.id).await.expect("delete"));
    assert!(!h.account().delete_account(&signed_up.user.id).await.expect("delete twice"));

    let resolver = h.state.resolver();
    assert!(resolver.authenticate(signed_up.session.token.as_str()).await.expect("auth").is_none());
    assert!(resolver.authenticate(other_user.session.token.as_str()).await.expect("auth").is_some());
}

#[tokio::test]
async fn test_purge_expired_keeps_live_sessions() {
    let h = Harness::new();
    h.sign_up("ada@example.com").await;
    h.clock.advance(Duration::minutes(30));
    let later = h.sign_up("grace@example.com").await;

    h.clock.advance(Duration::minutes(45));
    let purged = h.state.sessions().purge_expired().await.expect("purge");
    assert_eq!(purged, 1);

    assert!(
        h.state
            .resolver()
            .authenticate(later.session.token.as_str())
            .await
            .expect("auth")
            .is_some()
    );
    assert_eq!(h.state.sessions().purge_expired().await.expect("purge"), 0);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_ensure_admin_creates_then_promotes() {
    let h = Harness::new();
    let admin = h
        .admin()
        .ensure_admin("root@example.com", "administrator".to_string())
        .await
        .expect("create admin");
    assert!(admin.is_admin());

    let again = h
        .admin()
        .ensure_admin("ROOT@example.com", "ignored password".to_string())
        .await
        .expect("idempotent");
    assert_eq!(again.id, admin.id);

    let user = h.sign_up("ada@example.com").await.user;
    let promoted = h
        .admin()
        .ensure_admin("ada@example.com", "ignored password".to_string())
        .await
        .expect("promote");
    assert_eq!(promoted.id, user.id);
    assert!(promoted.is_admin());

    // The existing password still works
    assert!(h.sign_in("ada@example.com", PASSWORD).await.is_ok());
    assert_eq!(h.admin().list_users().await.expect("list").len(), 2);
}

// ============================================================================
// Router
// ============================================================================

#[tokio::test]
async fn test_router_sign_up_sets_cookie_and_authenticates() {
    let h = Harness::new();
    let app = h.router();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/signup",
            json!({ "email": "ada@example.com", "password": PASSWORD, "firstName": "Ada" }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie")
        .to_string();
    assert!(set_cookie.starts_with("sp_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Expires="));

    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["firstName"], "Ada");
    assert!(body["user"].get("passwordHash").is_none());

    let response = app.clone().oneshot(get_request("/me", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("X-Auth-Required").and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let response = app.clone().oneshot(get_request("/me", Some(&cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "ada@example.com");

    let response = app.clone().oneshot(get_request("/status", Some(&cookie))).await.expect("response");
    assert_eq!(body_json(response).await["authenticated"], true);

    let response = app.oneshot(get_request("/status", None)).await.expect("response");
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], false);
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_router_sign_in_failure_is_generic() {
    let h = Harness::new();
    h.sign_up("ada@example.com").await;
    let app = h.router();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/signin",
            json!({ "email": "ada@example.com", "password": "not the password" }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let wrong_password = body_json(response).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/signin",
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown = body_json(response).await;

    assert_eq!(wrong_password["detail"], "Invalid email or password");
    assert_eq!(wrong_password, unknown);
}

#[tokio::test]
async fn test_router_sign_out_clears_cookie() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let cookie = format!("sp_session={}", signed_up.session.token.as_str());
    let app = h.router();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/signout", json!({}), Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie");
    assert!(cleared.contains("Max-Age=0"));

    let response = app.clone().oneshot(get_request("/me", Some(&cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Signing out again is harmless
    let response = app
        .oneshot(json_request("POST", "/signout", json!({}), Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_router_admin_routes_require_admin_role() {
    let h = Harness::new();
    let user = h.sign_up("ada@example.com").await;
    let user_cookie = format!("sp_session={}", user.session.token.as_str());
    h.admin()
        .ensure_admin("root@example.com", "administrator".to_string())
        .await
        .expect("admin");
    let admin = h.sign_in("root@example.com", "administrator").await.expect("admin sign in");
    let admin_cookie = format!("sp_session={}", admin.session.token.as_str());
    let app = h.router();

    let response = app.clone().oneshot(get_request("/users", None)).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(get_request("/users", Some(&user_cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(get_request("/users", Some(&admin_cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(2));

    let delete = |cookie: &str, id: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/users/{id}"))
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .expect("request")
    };

    let response = app.clone().oneshot(delete(&admin_cookie, user.user.id.as_str())).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(delete(&admin_cookie, user.user.id.as_str())).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get_request("/me", Some(&user_cookie))).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_router_update_profile() {
    let h = Harness::new();
    let signed_up = h.sign_up("ada@example.com").await;
    let cookie = format!("sp_session={}", signed_up.session.token.as_str());

    let response = h
        .router()
        .oneshot(json_request("PATCH", "/me", json!({ "lastName": "  Byron " }), Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["lastName"], "Byron");
}
