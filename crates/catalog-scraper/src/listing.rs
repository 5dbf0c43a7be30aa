//! Raw record extraction from a loaded listing page.

use crate::error::ScraperError;
use crate::normalize::{leading_token, resolve_url, trailing_segment};
use crate::selectors::ListingSelectors;
use crate::session::PageSession;

/// One catalog entry exactly as read from the DOM.
///
/// Nothing here is validated: a missing element leaves its field `None`
/// rather than defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Trailing segment of the title link.
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    /// Image source resolved against the listing URL.
    pub image: Option<String>,
    /// Formatted price text, e.g. `"$1,234.56"`.
    pub price: Option<String>,
    pub description: Option<String>,
    /// Leading token of the review counter text.
    pub review_count: Option<String>,
    pub rating: usize,
}

/// Reads one [`RawRecord`] per catalog entry element.
#[derive(Debug, Clone, Default)]
pub struct ListingExtractor {
    selectors: ListingSelectors,
}

impl ListingExtractor {
    #[must_use]
    pub fn new(selectors: ListingSelectors) -> Self {
        Self { selectors }
    }

    /// Extracts raw records from a page already navigated to `listing_url`,
    /// in DOM order.
    ///
    /// # Errors
    ///
    /// Propagates any [`ScraperError`] from querying or reading the page.
    pub async fn extract<P: PageSession>(
        &self,
        page: &P,
        listing_url: &str,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let entries = page.query_all(&self.selectors.entry).await?;
        let mut records = Vec::with_capacity(entries.len());

        for entry in &entries {
            records.push(self.extract_entry(page, entry, listing_url).await?);
        }

        tracing::debug!(count = records.len(), url = listing_url, "listing entries read");
        Ok(records)
    }

    async fn extract_entry<P: PageSession>(
        &self,
        page: &P,
        entry: &P::Handle,
        listing_url: &str,
    ) -> Result<RawRecord, ScraperError> {
        let s = &self.selectors;

        let image = match page.query_first_within(entry, &s.image).await? {
            Some(img) => page
                .read_attribute(&img, "src")
                .await?
                .map(|src| resolve_url(listing_url, src.trim())),
            None => None,
        };

        let price = match page.query_first_within(entry, &s.price).await? {
            Some(el) => Some(page.read_text(&el).await?),
            None => None,
        };

        let (title, url) = match page.query_first_within(entry, &s.title).await? {
            Some(el) => (
                page.read_attribute(&el, "title").await?,
                page.read_attribute(&el, "href").await?,
            ),
            None => (None, None),
        };

        let description = match page.query_first_within(entry, &s.description).await? {
            Some(el) => Some(page.read_text(&el).await?),
            None => None,
        };

        let review_count = match page.query_first_within(entry, &s.review_count).await? {
            Some(el) => leading_token(&page.read_text(&el).await?).map(str::to_string),
            None => None,
        };

        let rating = page.query_within(entry, &s.rating_indicator).await?.len();

        Ok(RawRecord {
            id: url.as_deref().map(|href| trailing_segment(href).to_string()),
            title,
            url,
            image,
            price,
            description,
            review_count,
            rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureBrowser, FixtureSite};
    use crate::session::PageSource;

    const LISTING: &str = "https://shop.test/computers/laptops";

    const HTML: &str = r#"
        <div class="row">
          <div class="thumbnail">
            <img src="/images/x1.png">
            <div class="caption">
              <h4 class="price">$1,101.83</h4>
              <h4><a href="/product/548" class="title" title="Lenovo ThinkPad X1">Lenovo ThinkPad...</a></h4>
              <p class="description">Lenovo ThinkPad X1, 14" FHD</p>
            </div>
            <div class="ratings">
              <p class="pull-right">14 reviews</p>
              <p><span class="glyphicon"></span><span class="glyphicon"></span><span class="glyphicon"></span></p>
            </div>
          </div>
          <div class="thumbnail">
            <div class="caption">
              <h4><a href="/product/549" class="title" title="Dell XPS">Dell XPS</a></h4>
            </div>
          </div>
        </div>"#;

    async fn extract(html: &str) -> Vec<RawRecord> {
        let browser = FixtureBrowser::new(FixtureSite::new().with_page(LISTING, html));
        let mut page = browser.open_page().await.unwrap();
        page.navigate(LISTING).await.unwrap();
        ListingExtractor::default()
            .extract(&page, LISTING)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn extracts_complete_entry() {
        let records = extract(HTML).await;
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id.as_deref(), Some("548"));
        assert_eq!(first.title.as_deref(), Some("Lenovo ThinkPad X1"));
        assert_eq!(first.url.as_deref(), Some("/product/548"));
        assert_eq!(first.image.as_deref(), Some("https://shop.test/images/x1.png"));
        assert_eq!(first.price.as_deref(), Some("$1,101.83"));
        assert_eq!(
            first.description.as_deref(),
            Some("Lenovo ThinkPad X1, 14\" FHD")
        );
        assert_eq!(first.review_count.as_deref(), Some("14"));
        assert_eq!(first.rating, 3);
    }

    #[tokio::test]
    async fn missing_elements_stay_absent() {
        let records = extract(HTML).await;
        let second = &records[1];
        assert_eq!(second.id.as_deref(), Some("549"));
        assert!(second.image.is_none());
        assert!(second.price.is_none());
        assert!(second.description.is_none());
        assert!(second.review_count.is_none());
        assert_eq!(second.rating, 0);
    }

    #[tokio::test]
    async fn entry_without_title_link_has_no_id() {
        let records = extract(r#"<div class="thumbnail"><p class="description">x</p></div>"#).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].id.is_none());
        assert!(records[0].url.is_none());
        assert!(records[0].title.is_none());
    }

    #[tokio::test]
    async fn empty_listing_yields_no_records() {
        let records = extract("<div class=\"row\"></div>").await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn preserves_dom_order() {
        let html = (1..=5)
            .map(|i| {
                format!(
                    r#"<div class="thumbnail"><div class="caption"><a class="title" href="/product/{i}" title="Item {i}">x</a></div></div>"#
                )
            })
            .collect::<String>();
        let ids: Vec<String> = extract(&html)
            .await
            .into_iter()
            .filter_map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }
}
