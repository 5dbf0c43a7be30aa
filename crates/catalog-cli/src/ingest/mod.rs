//! The `ingest` command: one scrape of the listing into the catalog store.
//!
//! Per-item enrichment failures are logged and carried in the report rather
//! than propagated, so a single bad detail page does not abort the run.

mod error;
mod pipeline;
mod report;

use catalog_core::{AppConfig, ConfigError};
use catalog_db::{CatalogRepository, PgCatalogRepository};
use catalog_scraper::{BrowserOptions, ChromiumBrowser};

use pipeline::IngestionPipeline;

/// Connects the store (unless `dry_run`), launches the browser and runs the
/// pipeline, printing a one-line summary.
///
/// # Errors
///
/// Returns an error if the database or browser cannot be brought up, or if
/// the pipeline aborts.
pub(crate) async fn run_ingest(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let repo = match store_url(config, dry_run)? {
        None => None,
        Some(database_url) => {
            let pool = crate::connect_store(config, database_url).await?;
            let repo = PgCatalogRepository::new(pool);
            match catalog_db::run_migrations(repo.pool()).await {
                Ok(applied) if applied > 0 => tracing::info!(applied, "migrations applied"),
                Ok(_) => {}
                Err(e) => {
                    repo.close().await;
                    return Err(e.into());
                }
            }
            Some(repo)
        }
    };

    let browser = match ChromiumBrowser::launch(BrowserOptions::from_app_config(config)).await {
        Ok(browser) => browser,
        Err(e) => {
            if let Some(repo) = &repo {
                repo.close().await;
            }
            return Err(e.into());
        }
    };

    let pipeline = IngestionPipeline::from_app_config(config);
    let report = pipeline
        .run(
            browser,
            repo.as_ref().map(|r| r as &dyn CatalogRepository),
        )
        .await?;

    println!("{}", report.summary());
    Ok(())
}

/// Connection string for a persisting run; `None` for a dry run, which
/// never needs one.
fn store_url(config: &AppConfig, dry_run: bool) -> Result<Option<&str>, ConfigError> {
    if dry_run {
        Ok(None)
    } else {
        config.require_database_url().map(Some)
    }
}
