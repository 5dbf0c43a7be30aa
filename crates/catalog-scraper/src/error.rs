use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("failed to launch browser: {reason}")]
    Launch { reason: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("query for \"{selector}\" failed: {reason}")]
    Query { selector: String, reason: String },

    #[error("interaction with {target} failed: {reason}")]
    Interaction { target: String, reason: String },

    #[error("page has not been navigated or was already closed")]
    PageClosed,
}

impl ScraperError {
    /// `true` for failures reaching a page: unreachable, refused, or timed out.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            ScraperError::Navigation { .. } | ScraperError::NavigationTimeout { .. }
        )
    }

    /// `true` for failures acting on or reading from an already-loaded page.
    #[must_use]
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            ScraperError::Interaction { .. } | ScraperError::Query { .. }
        )
    }
}

/// Why one step of a detail-page enrichment failed.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Page(#[from] ScraperError),

    #[error("variant control value {value:?} is not a positive size")]
    InvalidSize { value: String },

    #[error("variant control {value:?} is no longer on the page")]
    ControlMissing { value: String },

    #[error("price element not found after selecting a variant")]
    PriceMissing,

    #[error("no numeric amount in price text {text:?}")]
    UnreadablePrice { text: String },
}
