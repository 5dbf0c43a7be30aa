//! CSS selectors describing the source DOM.

/// Selectors for the listing page. Everything except `entry` is evaluated
/// relative to one catalog entry element.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub entry: String,
    pub image: String,
    pub price: String,
    /// Element carrying the `href` and `title` attributes.
    pub title: String,
    pub description: String,
    /// Text like `"14 reviews"`.
    pub review_count: String,
    /// One element per rating point.
    pub rating_indicator: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            entry: ".thumbnail".to_string(),
            image: "img".to_string(),
            price: ".caption .price".to_string(),
            title: ".caption .title".to_string(),
            description: ".description".to_string(),
            review_count: ".ratings .pull-right".to_string(),
            rating_indicator: ".ratings .glyphicon".to_string(),
        }
    }
}

/// Selectors for an item's detail page.
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    /// Variant controls; each carries a `value` and may carry a `disabled` class.
    pub variant_control: String,
    /// Price text that updates after a variant is activated.
    pub price: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            variant_control: ".swatches button".to_string(),
            price: ".caption .pull-right".to_string(),
        }
    }
}

impl DetailSelectors {
    /// Selector addressing the control whose `value` is `value`.
    #[must_use]
    pub fn control_with_value(&self, value: &str) -> String {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}[value=\"{escaped}\"]", self.variant_control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_with_value_targets_attribute() {
        let selectors = DetailSelectors::default();
        assert_eq!(
            selectors.control_with_value("128"),
            ".swatches button[value=\"128\"]"
        );
    }

    #[test]
    fn control_with_value_escapes_quotes() {
        let selectors = DetailSelectors::default();
        assert_eq!(
            selectors.control_with_value("a\"b"),
            ".swatches button[value=\"a\\\"b\"]"
        );
    }
}
