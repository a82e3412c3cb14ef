//! OlivoMarket CLI - Database migrations, catalog import and order maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog database migrations
//! om-cli migrate
//!
//! # Preview, then run a bulk import
//! om-cli import productos.csv --dry-run
//! om-cli import productos.csv
//!
//! # Create the base categories
//! om-cli seed catalog
//!
//! # Category maintenance
//! om-cli categories sync Congelados Postres
//! om-cli categories delete <id>
//!
//! # Local order history in OLIVO_DATA_DIR
//! om-cli orders cleanup
//! om-cli orders stats
//! om-cli orders restore-demo
//! ```
//!
//! Set `OLIVO_LOG_FORMAT=json` for JSON logs; `RUST_LOG` controls verbosity.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "om-cli")]
#[command(author, version, about = "OlivoMarket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run catalog database migrations
    Migrate,
    /// Bulk import products from a CSV or JSON file
    Import {
        /// Path to a .csv or .json file
        file: PathBuf,

        /// Parse and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Seed the catalog
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Maintain the local order history
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create the base categories
    Catalog,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create any of the named categories that do not exist
    Sync {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete a category with no products
    Delete { id: String },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Remove duplicate and invalid orders
    Cleanup,
    /// Print order statistics as JSON
    Stats,
    /// Add the demo orders back
    RestoreDemo,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("OLIVO_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { file, dry_run } => commands::catalog::import(&file, dry_run).await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog => commands::catalog::seed().await?,
        },
        Commands::Categories { action } => match action {
            CategoryAction::Sync { names } => commands::catalog::sync_categories(&names).await?,
            CategoryAction::Delete { id } => commands::catalog::delete_category(&id).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::Cleanup => commands::orders::cleanup()?,
            OrderAction::Stats => commands::orders::stats()?,
            OrderAction::RestoreDemo => commands::orders::restore_demo()?,
        },
    }
    Ok(())
}
