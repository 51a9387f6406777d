//! Server configuration, read from the environment

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Context;
use auth::AuthConfig;
use axum::http::HeaderValue;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;
/// Ten years
const MAX_SESSION_TTL_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug)]
pub struct ApiConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub production: bool,
    pub auth: AuthConfig,
    /// `None` disables the periodic purge
    pub purge_interval: Option<StdDuration>,
    pub frontend_origins: Vec<HeaderValue>,
    pub admin: Option<AdminBootstrap>,
}

/// Credentials for the admin account ensured at startup
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:31113")?;

        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

        let mut auth = if production {
            AuthConfig::default()
        } else {
            AuthConfig::development()
        };
        if let Some(hours) = var("SESSION_TTL_HOURS") {
            let hours: i64 = hours
                .trim()
                .parse()
                .context("SESSION_TTL_HOURS must be an integer")?;
            anyhow::ensure!(
                (1..=MAX_SESSION_TTL_HOURS).contains(&hours),
                "SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}"
            );
            auth = auth.with_session_ttl(chrono::Duration::hours(hours));
        }

        let purge_secs = match var("SESSION_PURGE_INTERVAL_SECS") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .context("SESSION_PURGE_INTERVAL_SECS must be a non-negative integer")?,
            None => DEFAULT_PURGE_INTERVAL_SECS,
        };
        let purge_interval = (purge_secs > 0).then(|| StdDuration::from_secs(purge_secs));

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.into())
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            data_dir,
            bind_addr,
            production,
            auth,
            purge_interval,
            frontend_origins,
            admin,
        })
    }
}
