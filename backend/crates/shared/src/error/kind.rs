//! Error Kind - Classification of errors
//!
//! Each [`ErrorKind`] corresponds to exactly one HTTP status. Crates map
//! their own error enums onto these kinds; the HTTP boundary only ever
//! looks at the kind.

use serde::Serialize;

/// Error classification, one variant per HTTP status the service emits.
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
/// assert_eq!(ErrorKind::Unauthorized.as_str(), "Unauthorized");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - malformed input (validation failures)
    BadRequest,
    /// 401 - no identity, or a credential that did not verify
    Unauthorized,
    /// 403 - identity known, role insufficient
    Forbidden,
    /// 404 - referenced document does not exist
    NotFound,
    /// 409 - uniqueness violation (e.g. email already registered)
    Conflict,
    /// 500 - storage or other server-side failure
    InternalServerError,
    /// 503 - a dependency is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorKind {
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Standard reason phrase for the status
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx kinds. Their details are logged server-side and never sent to
    /// the client.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
