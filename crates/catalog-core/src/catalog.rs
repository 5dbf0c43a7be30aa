use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A validated catalog entry read from the listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Trailing path segment of the detail URL, e.g. `548` for `.../product/548`.
    ///
    /// Stable across runs: the same source slug always yields the same id.
    pub id: i64,
    pub title: String,
    /// Detail link exactly as the listing exposes it.
    pub url: String,
    /// Absolute image URL.
    pub image: String,
    pub price: Decimal,
    /// May be empty.
    pub description: String,
    pub review_count: i32,
    /// Number of rating indicator elements rendered for the entry.
    pub review_score: i32,
}

/// A selectable configuration (e.g. storage size) of an [`Item`].
///
/// `(item_id, size)` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub item_id: i64,
    pub size: i32,
    pub enabled: bool,
    /// Price displayed after activating the option.
    ///
    /// `None` for disabled options: they are never activated, so no price
    /// is ever read for them.
    pub price: Option<Decimal>,
}

/// An item together with the variant options resolved on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub item: Item,
    pub variants: Vec<VariantOption>,
}

impl EnrichedItem {
    /// Wraps an item that has not been (or could not be) enriched.
    #[must_use]
    pub fn bare(item: Item) -> Self {
        Self {
            item,
            variants: Vec::new(),
        }
    }
}
