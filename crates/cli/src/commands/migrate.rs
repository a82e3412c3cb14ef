//! Database migration command.
//!
//! # Environment Variables
//!
//! - `OLIVO_DATABASE_URL` - `PostgreSQL` connection string for the catalog
//!
//! # Migration Files
//!
//! Catalog migrations: `crates/admin/migrations/`

use olivo_market_admin::AdminConfig;
use olivo_market_admin::config::ConfigError;
use olivo_market_admin::db;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if configuration is missing, the database is
/// unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = AdminConfig::from_env()?;

    info!("Connecting to catalog database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    info!("Running catalog migrations...");
    db::run_migrations(&pool).await?;

    info!("Catalog migrations complete!");
    Ok(())
}
