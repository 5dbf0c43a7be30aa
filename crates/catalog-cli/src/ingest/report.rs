use catalog_scraper::{EnrichmentFailure, ValidationFailure};

/// Counts and per-record diagnostics from one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Raw records read from the listing page.
    pub found: usize,
    pub valid: usize,
    pub selected: usize,
    /// Variant options resolved across all enriched items.
    pub enriched_variants: usize,
    /// Rows written by the commit; `0` on a dry run.
    pub upserted: u64,
    pub dry_run: bool,
    pub validation_failures: Vec<ValidationFailure>,
    pub enrichment_failures: Vec<EnrichmentFailure>,
}

impl IngestReport {
    #[must_use]
    pub fn summary(&self) -> String {
        let persisted = if self.dry_run {
            "dry-run, nothing persisted".to_string()
        } else {
            format!("{} rows upserted", self.upserted)
        };
        format!(
            "{} found, {} valid, {} selected, {} variants; {} validation failures, \
             {} enrichment failures; {persisted}",
            self.found,
            self.valid,
            self.selected,
            self.enriched_variants,
            self.validation_failures.len(),
            self.enrichment_failures.len(),
        )
    }
}
