//! Extraction -> validation -> selection -> enrichment -> persistence.

use catalog_core::{AppConfig, Item, VariantOption};
use catalog_db::CatalogRepository;
use catalog_scraper::{
    filter_for_token, validate_records, DetailSelectors, ListingExtractor, PageSession,
    PageSource, RawRecord, ScraperError, SelectionFilter, VariantEnricher,
};

use super::error::IngestError;
use super::report::IngestReport;

pub struct IngestionPipeline {
    listing_url: String,
    extractor: ListingExtractor,
    filter: Box<dyn SelectionFilter>,
    enricher: VariantEnricher,
    max_concurrent: usize,
    persist_unselected: bool,
}

impl IngestionPipeline {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            extractor: ListingExtractor::default(),
            filter: filter_for_token(&config.selection_token),
            enricher: VariantEnricher::new(
                config.detail_url_base.clone(),
                DetailSelectors::default(),
            ),
            max_concurrent: config.enrich_max_concurrent.max(1),
            persist_unselected: config.persist_unselected,
        }
    }

    /// Runs one ingestion against `source`, persisting through `repo`. With
    /// no repository the run is a dry run and nothing is written.
    ///
    /// The browser is shut down and the repository closed before this
    /// returns, on success and on every failure.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Listing`] if the listing page cannot be loaded
    /// or read, [`IngestError::NoValidRecords`] if validation leaves nothing
    /// to ingest, or [`IngestError::Persistence`] if the commit fails.
    pub async fn run<S: PageSource>(
        &self,
        mut source: S,
        repo: Option<&dyn CatalogRepository>,
    ) -> Result<IngestReport, IngestError> {
        let result = self.execute(&source, repo).await;

        if let Err(e) = source.shutdown().await {
            tracing::warn!(error = %e, "browser shutdown failed");
        }
        if let Some(repo) = repo {
            repo.close().await;
        }

        result
    }

    async fn execute<S: PageSource>(
        &self,
        source: &S,
        repo: Option<&dyn CatalogRepository>,
    ) -> Result<IngestReport, IngestError> {
        let records = self.load_listing(source).await?;
        let found = records.len();
        tracing::info!(found, url = %self.listing_url, "listing extracted");

        let validation = validate_records(&records);
        for failure in &validation.failures {
            tracing::warn!(
                index = failure.index,
                raw_id = failure.raw_id.as_deref().unwrap_or("?"),
                field = failure.field,
                reason = %failure.reason,
                "record rejected"
            );
        }
        if validation.items.is_empty() {
            return Err(IngestError::NoValidRecords {
                found,
                rejected: validation.failures.len(),
            });
        }
        let valid = validation.items.len();

        let selected = self.filter.select(&validation.items);
        tracing::info!(valid, selected = selected.len(), "items selected for enrichment");
        let selected_count = selected.len();

        let outcomes = self
            .enricher
            .enrich_all(source, selected, self.max_concurrent)
            .await;

        let mut items: Vec<Item> = Vec::with_capacity(valid);
        let mut variants: Vec<VariantOption> = Vec::new();
        let mut enrichment_failures = Vec::new();
        for outcome in outcomes {
            enrichment_failures.extend(outcome.failures);
            items.push(outcome.enriched.item);
            variants.extend(outcome.enriched.variants);
        }
        let enriched_variants = variants.len();

        if self.persist_unselected {
            let unselected = validation
                .items
                .iter()
                .filter(|item| !self.filter.selects(item))
                .cloned();
            items.extend(unselected);
        }

        let upserted = match repo {
            Some(repo) => {
                let written = repo.commit(&items, &variants).await?;
                tracing::info!(upserted = written, "catalog persisted");
                written
            }
            None => {
                tracing::info!(
                    items = items.len(),
                    variants = variants.len(),
                    "dry run; skipping persistence"
                );
                0
            }
        };

        Ok(IngestReport {
            found,
            valid,
            selected: selected_count,
            enriched_variants,
            upserted,
            dry_run: repo.is_none(),
            validation_failures: validation.failures,
            enrichment_failures,
        })
    }

    /// Reads raw records from the listing page on a page that is closed
    /// whether or not extraction succeeds.
    async fn load_listing<S: PageSource>(&self, source: &S) -> Result<Vec<RawRecord>, ScraperError> {
        let mut page = source.open_page().await?;
        let result = match page.navigate(&self.listing_url).await {
            Ok(()) => self.extractor.extract(&page, &self.listing_url).await,
            Err(e) => Err(e),
        };
        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, "failed to close listing page");
        }
        result
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
