//! Storekeep server - merchant inventory API.
//!
//! # Architecture
//!
//! - Axum web framework, JSON API under `/api/v1`
//! - `PostgreSQL` (or process memory) for stores and items
//! - tower-sessions for merchant sessions, optional signed bearer tokens
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! `cargo run -p storekeep-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storekeep_server::config::{ServerConfig, StorageBackend};
use storekeep_server::db::{self, CatalogStore, MemoryCatalogStore, PgCatalogStore};
use storekeep_server::middleware::create_session_layer;
use storekeep_server::{AppState, app};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env()?;

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storekeep_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    tracing::debug!(?config, "Configuration loaded");

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    match (config.storage, config.database_url.clone()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = db::create_pool(&database_url).await?;
            tracing::info!("Database pool created");

            let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool.clone()));
            let session_layer = create_session_layer(PostgresStore::new(pool), &config);
            let state = AppState::new(config, catalog)?;

            tracing::info!("storekeep listening on {} (postgres)", addr);
            axum::serve(listener, app(state, session_layer))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        (StorageBackend::Postgres, None) => {
            return Err("STOREKEEP_DATABASE_URL is required for postgres storage".into());
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; all data is lost on shutdown");

            let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryCatalogStore::new());
            let session_layer = create_session_layer(MemoryStore::default(), &config);
            let state = AppState::new(config, catalog)?;

            tracing::info!("storekeep listening on {} (memory)", addr);
            axum::serve(listener, app(state, session_layer))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
