//! Page capability traits.
//!
//! Extraction and enrichment only ever talk to a page through
//! [`PageSession`], so the same code drives a real Chromium tab
//! ([`crate::browser`]) or an in-memory HTML fixture ([`crate::fixture`]).
//!
//! Every method suspends the caller until the underlying render or
//! interaction has completed. None of them retry.

use async_trait::async_trait;

use crate::error::ScraperError;

/// Opens independent pages. One source is shared by the listing phase and
/// every concurrent detail-page enrichment; each page it hands out is owned
/// exclusively by its caller.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Page: PageSession;

    /// Opens a fresh, blank page.
    async fn open_page(&self) -> Result<Self::Page, ScraperError>;

    /// Releases the underlying browser. Pages still open become unusable.
    async fn shutdown(&mut self) -> Result<(), ScraperError>;
}

/// A single page (browser tab) context.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Opaque reference to an element on the current document.
    type Handle: Send + Sync;

    /// Loads `url` and waits for it to finish loading.
    ///
    /// Fails with [`ScraperError::Navigation`] or
    /// [`ScraperError::NavigationTimeout`].
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// All elements matching `selector`, in document order. Possibly empty.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Handle>, ScraperError>;

    /// Descendants of `scope` matching `selector`, in document order.
    async fn query_within(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> Result<Vec<Self::Handle>, ScraperError>;

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    /// Rendered text content, trimmed.
    async fn read_text(&self, handle: &Self::Handle) -> Result<String, ScraperError>;

    /// Activates the element and returns once the page has settled.
    ///
    /// Fails with [`ScraperError::Interaction`] when the element is not
    /// actionable.
    async fn click(&mut self, handle: &Self::Handle) -> Result<(), ScraperError>;

    async fn close(self) -> Result<(), ScraperError>;

    /// First match for `selector` within `scope`, if any.
    async fn query_first_within(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, ScraperError> {
        Ok(self.query_within(scope, selector).await?.into_iter().next())
    }

    /// First match for `selector` on the page, if any.
    async fn query_first(&self, selector: &str) -> Result<Option<Self::Handle>, ScraperError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }
}
