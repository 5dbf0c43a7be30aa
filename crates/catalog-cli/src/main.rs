mod ingest;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Scrape the product catalog into Postgres")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape, validate, enrich and persist the catalog (the default command)
    Ingest {
        /// Run every scraping step but write nothing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = catalog_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Ingest { dry_run }) => ingest::run_ingest(&config, dry_run).await?,
        None => ingest::run_ingest(&config, false).await?,
        Some(Commands::Migrate) => {
            let pool = connect_store(&config, config.require_database_url()?).await?;
            let applied = catalog_db::run_migrations(&pool).await;
            pool.close().await;
            println!("applied {} migrations", applied?);
        }
    }

    Ok(())
}

/// Opens the pool and checks it answers before any work is done against it.
async fn connect_store(
    config: &catalog_core::AppConfig,
    database_url: &str,
) -> anyhow::Result<catalog_db::PgPool> {
    let pool_config = catalog_db::PoolConfig::from_app_config(config);
    let pool = catalog_db::connect_pool(database_url, pool_config).await?;
    if let Err(e) = catalog_db::ping(&pool).await {
        pool.close().await;
        return Err(e.into());
    }
    tracing::debug!("database reachable");
    Ok(pool)
}
