//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use auth::application::AdminUseCase;
use auth::{AuthAppState, DocumentAuthRepository, SessionManager, auth_router};
use axum::{
    Router,
    http::{Method, header},
};
use docstore::{JsonFileEngine, StoreRegistry};
use platform::clock::{Clock, SystemClock};
use tokio::net::TcpListener;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ApiConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

type Repo = DocumentAuthRepository<JsonFileEngine>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,docstore=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        production = config.production,
        session_ttl_hours = config.auth.session_ttl.num_hours(),
        "Configuration loaded"
    );

    let registry = StoreRegistry::open(&config.data_dir);
    let repo = DocumentAuthRepository::new(&registry)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AuthAppState::new(repo, config.auth.clone(), clock);

    // Startup cleanup: remove expired sessions
    // Errors here should not prevent server startup
    if let Err(e) = state.sessions().purge_expired().await {
        tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
    }

    if let Some(period) = config.purge_interval {
        spawn_session_purge(state.sessions(), period);
    }

    if let Some(admin) = &config.admin {
        let use_case = AdminUseCase::new(state.repo.clone(), state.sessions(), state.clock.clone());
        let user = use_case
            .ensure_admin(&admin.email, admin.password.clone())
            .await
            .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {e}"))?;
        tracing::info!(user_id = %user.id, "Admin account ready");
    }

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origins.clone())
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Purge expired sessions every `period`. Failures are logged and retried on
/// the next tick.
fn spawn_session_purge(sessions: SessionManager<Repo>, period: StdDuration) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = sessions.purge_expired().await {
                tracing::warn!(error = %e, "Periodic session purge failed");
            }
        }
    });
}
