//! Cookie Management Infrastructure
//!
//! Builds `Set-Cookie` values and reads cookies back out of request
//! headers. Values written here are opaque hex tokens, so no escaping is
//! performed.

use axum::http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue};
use chrono::{DateTime, Utc};

/// `Expires` attribute layout (IMF-fixdate, RFC 9110 §5.6.7)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes shared by every cookie with the same name
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    /// Build a Set-Cookie value. `expires` of `None` makes a browser-session
    /// cookie.
    pub fn build_set_cookie(&self, value: &str, expires: Option<DateTime<Utc>>) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(expires) = expires {
            cookie.push_str(&format!("; Expires={}", format_http_date(expires)));
        }

        cookie
    }

    /// Set-Cookie value that makes the browser drop the cookie
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name, self.path
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie
    }

    pub fn set_cookie_header(
        &self,
        value: &str,
        expires: Option<DateTime<Utc>>,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.build_set_cookie(value, expires))
    }

    pub fn delete_cookie_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.build_delete_cookie())
    }
}

pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// Extract a cookie value from request headers.
///
/// HTTP/2 clients may split cookies over several `Cookie` headers, so all
/// of them are searched. The first match wins.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.trim_matches('"').to_string())
        })
}
