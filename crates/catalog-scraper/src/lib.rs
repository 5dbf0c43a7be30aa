pub mod browser;
pub mod enrich;
pub mod error;
pub mod fixture;
pub mod listing;
pub mod normalize;
pub mod select;
pub mod selectors;
pub mod session;
pub mod validate;

pub use browser::{BrowserOptions, ChromiumBrowser, ChromiumPage};
pub use enrich::{
    EnrichPhase, EnrichmentFailure, EnrichmentOutcome, EnrichmentState, VariantControl,
    VariantEnricher,
};
pub use error::{EnrichError, ScraperError};
pub use listing::{ListingExtractor, RawRecord};
pub use normalize::normalize_price;
pub use select::{filter_for_token, SelectAll, SelectionFilter, TitleContains};
pub use selectors::{DetailSelectors, ListingSelectors};
pub use session::{PageSession, PageSource};
pub use validate::{validate_record, validate_records, ValidationFailure, ValidationOutcome};
