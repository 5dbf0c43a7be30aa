//! Selection policies deciding which validated items get enriched.

use catalog_core::Item;

/// A pure predicate over validated items.
pub trait SelectionFilter: Send + Sync {
    fn selects(&self, item: &Item) -> bool;

    /// The selected subset, in input order.
    fn select(&self, items: &[Item]) -> Vec<Item> {
        items.iter().filter(|i| self.selects(i)).cloned().collect()
    }
}

/// Case-insensitive substring match of a token against the item title.
#[derive(Debug, Clone)]
pub struct TitleContains {
    token: String,
}

impl TitleContains {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            token: token.trim().to_lowercase(),
        }
    }
}

impl SelectionFilter for TitleContains {
    fn selects(&self, item: &Item) -> bool {
        item.title.to_lowercase().contains(&self.token)
    }
}

/// Selects every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl SelectionFilter for SelectAll {
    fn selects(&self, _item: &Item) -> bool {
        true
    }
}

/// Builds the configured policy: a blank token selects everything.
#[must_use]
pub fn filter_for_token(token: &str) -> Box<dyn SelectionFilter> {
    if token.trim().is_empty() {
        Box::new(SelectAll)
    } else {
        Box::new(TitleContains::new(token))
    }
}
