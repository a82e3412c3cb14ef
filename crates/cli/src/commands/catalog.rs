//! Catalog commands: bulk import, seeding and category maintenance.
//!
//! # Environment Variables
//!
//! - `OLIVO_DATABASE_URL` - `PostgreSQL` connection string for the catalog
//! - `OLIVO_BULK_MAX_RECORDS` - Largest accepted import (default: 5000)

use std::path::Path;

use olivo_market_admin::config::ConfigError;
use olivo_market_admin::{AdminConfig, CatalogService, PgCatalogRepository, db};
use olivo_market_core::import::parse_file;
use olivo_market_core::{BulkItem, BulkReport, CatalogApi, CatalogError, Caller, CategoryId, ImportError};
use thiserror::Error;
use tracing::{info, warn};

/// Identity the CLI acts under.
const OPERATOR: &str = "om-cli";

#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

async fn connect() -> Result<CatalogService<PgCatalogRepository>, CatalogCommandError> {
    let config = AdminConfig::from_env()?;
    info!("Connecting to catalog database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    Ok(CatalogService::new(PgCatalogRepository::new(pool), config.bulk_max_records))
}

/// Parse `file` and submit it as one bulk batch.
///
/// # Errors
///
/// Returns `CatalogCommandError` if the file cannot be read or parsed, or the
/// batch is rejected as a whole. Per-record failures are only reported.
pub async fn import(file: &Path, dry_run: bool) -> Result<(), CatalogCommandError> {
    let path = file.display().to_string();
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CatalogCommandError::Read {
            path: path.clone(),
            source,
        })?;
    let batch = parse_file(&path, &text)?;
    for (line, reason) in &batch.dropped {
        warn!(line, reason = %reason, "Row dropped");
    }
    info!(rows = batch.rows.len(), dropped = batch.dropped.len(), "Parsed {path}");

    if dry_run {
        #[allow(clippy::print_stdout)]
        for row in &batch.rows {
            let price = row.price.map_or_else(|| "(no price)".to_owned(), |p| p.to_string());
            println!("{}\t{}\t{}\t{}", row.slug, row.name, price, row.categories.join(";"));
        }
        info!("Dry run, nothing submitted");
        return Ok(());
    }

    let items: Vec<BulkItem> = batch.rows.into_iter().map(BulkItem::from).collect();
    let service = connect().await?;
    let report = service.bulk_create(&Caller::admin(OPERATOR), items).await?;
    print_report(&report);
    Ok(())
}

/// Create the base categories.
///
/// # Errors
///
/// Returns `CatalogCommandError` on configuration or database failures.
pub async fn seed() -> Result<(), CatalogCommandError> {
    let service = connect().await?;
    let created = service.seed_catalog(&Caller::admin(OPERATOR)).await?;
    #[allow(clippy::print_stdout)]
    for category in &created {
        println!("created {} ({})", category.name, category.slug);
    }
    Ok(())
}

/// Create whichever of `names` are missing.
///
/// # Errors
///
/// Returns `CatalogCommandError` on configuration, validation or database
/// failures.
pub async fn sync_categories(names: &[String]) -> Result<(), CatalogCommandError> {
    let service = connect().await?;
    let created = service.sync_categories(&Caller::admin(OPERATOR), names).await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{} categories created", created.len());
    }
    Ok(())
}

/// Delete a category that has no products.
///
/// # Errors
///
/// Returns `CatalogCommandError::Catalog` with a conflict while products
/// still reference the category.
pub async fn delete_category(id: &str) -> Result<(), CatalogCommandError> {
    let service = connect().await?;
    service
        .delete_category(&Caller::admin(OPERATOR), &CategoryId::new(id))
        .await?;
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_report(report: &BulkReport) {
    println!("created:  {}", report.created);
    println!("skipped:  {}", report.skipped);
    if !report.created_categories.is_empty() {
        println!("new categories: {}", report.created_categories.join(", "));
    }
    if !report.is_clean() {
        println!("errors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  - {error}");
        }
    }
}
