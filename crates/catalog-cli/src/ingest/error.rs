use catalog_db::DbError;
use catalog_scraper::ScraperError;
use thiserror::Error;

/// Failures that end an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("listing page could not be scraped: {0}")]
    Listing(#[from] ScraperError),

    #[error("no valid records: {found} found, {rejected} rejected")]
    NoValidRecords { found: usize, rejected: usize },

    #[error("catalog batch was not persisted: {0}")]
    Persistence(#[from] DbError),
}
