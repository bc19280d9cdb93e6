//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! storekeep migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREKEEP_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Inventory migrations: `crates/server/migrations/`. The session table is
//! created by `tower-sessions-sqlx-store` in the `tower_sessions` schema.

use secrecy::{ExposeSecret, SecretString};
use tower_sessions_sqlx_store::PostgresStore;

use storekeep_server::db::create_pool;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("STOREKEEP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREKEEP_DATABASE_URL"))
}

/// Run inventory migrations, then the session store migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    if database_url.expose_secret().is_empty() {
        return Err(MigrationError::MissingEnvVar("STOREKEEP_DATABASE_URL"));
    }

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running inventory migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
