//! Session cookie on responses
//!
//! Other features that issue sessions themselves use these to attach the
//! cookie, so the attributes stay identical everywhere.

use axum::http::header;
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Append `Set-Cookie` for `token`, expiring together with the session
pub fn set_auth_cookie(
    response: &mut Response,
    config: &AuthConfig,
    token: &str,
    expires_at: DateTime<Utc>,
) -> AuthResult<()> {
    let value = config
        .cookie()
        .set_cookie_header(token, Some(expires_at))
        .map_err(|e| AuthError::Internal(format!("Invalid session cookie: {e}")))?;

    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

/// Append a `Set-Cookie` that removes the session cookie
pub fn clear_auth_cookie(response: &mut Response, config: &AuthConfig) -> AuthResult<()> {
    let value = config
        .cookie()
        .delete_cookie_header()
        .map_err(|e| AuthError::Internal(format!("Invalid session cookie: {e}")))?;

    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use chrono::TimeZone;

    #[test]
    fn test_set_auth_cookie_attributes() {
        let mut response = ().into_response();
        let expires_at = Utc.with_ymd_and_hms(2031, 6, 15, 12, 0, 0).unwrap();

        set_auth_cookie(&mut response, &AuthConfig::default(), "deadbeef", expires_at).unwrap();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("sp_session=deadbeef"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Expires=Sun, 15 Jun 2031 12:00:00 GMT"));
    }

    #[test]
    fn test_development_cookie_is_not_secure() {
        let mut response = ().into_response();
        set_auth_cookie(&mut response, &AuthConfig::development(), "ab", Utc::now()).unwrap();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_auth_cookie_expires_immediately() {
        let mut response = ().into_response();
        clear_auth_cookie(&mut response, &AuthConfig::default()).unwrap();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("sp_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_cookies_are_appended() {
        let mut response = ().into_response();
        let config = AuthConfig::default();
        clear_auth_cookie(&mut response, &config).unwrap();
        set_auth_cookie(&mut response, &config, "ab", Utc::now()).unwrap();

        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
    }
}
