//! In-memory [`PageSource`] backed by static HTML documents.
//!
//! Each URL maps to one HTML document. Clicking an element whose `value`
//! attribute has a registered transition swaps the page to a new document,
//! which is how detail pages simulate the price updating after a variant is
//! activated. Everything the pages do is appended to a shared
//! [`FixtureLog`] so tests can assert on ordering and teardown.
//!
//! Navigation and clicks yield to the runtime once, like a real browser
//! round-trip, so concurrently driven pages actually interleave.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::session::{PageSession, PageSource};

/// Static site definition: documents by URL plus click transitions.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    documents: HashMap<String, String>,
    transitions: HashMap<(String, String), String>,
    failing_clicks: HashSet<(String, String)>,
}

impl FixtureSite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` at `url`. URLs without a document fail navigation.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.documents.insert(url.into(), html.into());
        self
    }

    /// After clicking an element with `value` on `url`, the page shows `html`.
    #[must_use]
    pub fn with_transition(
        mut self,
        url: impl Into<String>,
        value: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        self.transitions
            .insert((url.into(), value.into()), html.into());
        self
    }

    /// Clicking an element with `value` on `url` fails as not actionable.
    #[must_use]
    pub fn with_failing_click(mut self, url: impl Into<String>, value: impl Into<String>) -> Self {
        self.failing_clicks.insert((url.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureEvent {
    Navigate { url: String },
    Click { url: String, value: String },
    ReadText { url: String, text: String },
}

#[derive(Debug, Clone, Default)]
pub struct FixtureLog {
    pub events: Vec<FixtureEvent>,
    pub pages_opened: usize,
    pub pages_closed: usize,
    /// Highest number of pages open at the same time.
    pub max_open_pages: usize,
    pub shut_down: bool,
}

impl FixtureLog {
    /// `value` attributes of every clicked element on `url`, in click order.
    #[must_use]
    pub fn clicks_on(&self, url: &str) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FixtureEvent::Click { url: u, value } if u == url => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

/// [`PageSource`] serving a [`FixtureSite`].
#[derive(Debug, Clone)]
pub struct FixtureBrowser {
    site: Arc<FixtureSite>,
    log: Arc<Mutex<FixtureLog>>,
}

impl FixtureBrowser {
    #[must_use]
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(Mutex::new(FixtureLog::default())),
        }
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn log(&self) -> FixtureLog {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PageSource for FixtureBrowser {
    type Page = FixturePage;

    async fn open_page(&self) -> Result<FixturePage, ScraperError> {
        record(&self.log, |log| {
            log.pages_opened += 1;
            let open = log.pages_opened - log.pages_closed;
            log.max_open_pages = log.max_open_pages.max(open);
        });
        Ok(FixturePage {
            site: Arc::clone(&self.site),
            log: Arc::clone(&self.log),
            current: None,
        })
    }

    async fn shutdown(&mut self) -> Result<(), ScraperError> {
        record(&self.log, |log| log.shut_down = true);
        Ok(())
    }
}

/// Element reference: a chain of `(selector, index)` steps from the
/// document root, re-resolved against the current document on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureHandle {
    path: Vec<(String, usize)>,
}

#[derive(Debug)]
pub struct FixturePage {
    site: Arc<FixtureSite>,
    log: Arc<Mutex<FixtureLog>>,
    current: Option<(String, String)>,
}

impl FixturePage {
    fn document(&self) -> Result<(&str, Html), ScraperError> {
        let (url, html) = self.current.as_ref().ok_or(ScraperError::PageClosed)?;
        Ok((url.as_str(), Html::parse_document(html)))
    }

    fn collect_handles(
        &self,
        base: &[(String, usize)],
        selector: &str,
    ) -> Result<Vec<FixtureHandle>, ScraperError> {
        let (_, html) = self.document()?;
        let scope = resolve(&html, base)?;
        let parsed = parse_selector(selector)?;
        let count = scope.select(&parsed).count();
        Ok((0..count)
            .map(|index| {
                let mut path = base.to_vec();
                path.push((selector.to_string(), index));
                FixtureHandle { path }
            })
            .collect())
    }

    fn attribute_of(&self, handle: &FixtureHandle, name: &str) -> Result<Option<String>, ScraperError> {
        let (_, html) = self.document()?;
        let element = resolve(&html, &handle.path)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    fn text_of(&self, handle: &FixtureHandle) -> Result<(String, String), ScraperError> {
        let (url, html) = self.document()?;
        let element = resolve(&html, &handle.path)?;
        let text = element.text().collect::<String>().trim().to_string();
        Ok((url.to_string(), text))
    }

    fn activate(&mut self, handle: &FixtureHandle) -> Result<(), ScraperError> {
        let (url, value) = {
            let (url, html) = self.document()?;
            let element = resolve(&html, &handle.path)?;
            let value = element.value().attr("value").unwrap_or_default().to_string();
            if element.value().attr("disabled").is_some() {
                return Err(ScraperError::Interaction {
                    target: describe(&handle.path),
                    reason: "element is disabled".to_string(),
                });
            }
            (url.to_string(), value)
        };

        let key = (url.clone(), value.clone());
        if self.site.failing_clicks.contains(&key) {
            return Err(ScraperError::Interaction {
                target: describe(&handle.path),
                reason: "element is not clickable".to_string(),
            });
        }

        record(&self.log, |log| {
            log.events.push(FixtureEvent::Click {
                url: url.clone(),
                value,
            });
        });

        if let Some(next) = self.site.transitions.get(&key) {
            self.current = Some((url, next.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageSession for FixturePage {
    type Handle = FixtureHandle;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        tokio::task::yield_now().await;
        record(&self.log, |log| {
            log.events.push(FixtureEvent::Navigate {
                url: url.to_string(),
            });
        });
        let html = self
            .site
            .documents
            .get(url)
            .ok_or_else(|| ScraperError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })?;
        self.current = Some((url.to_string(), html.clone()));
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FixtureHandle>, ScraperError> {
        self.collect_handles(&[], selector)
    }

    async fn query_within(
        &self,
        scope: &FixtureHandle,
        selector: &str,
    ) -> Result<Vec<FixtureHandle>, ScraperError> {
        self.collect_handles(&scope.path, selector)
    }

    async fn read_attribute(
        &self,
        handle: &FixtureHandle,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        self.attribute_of(handle, name)
    }

    async fn read_text(&self, handle: &FixtureHandle) -> Result<String, ScraperError> {
        let (url, text) = self.text_of(handle)?;
        record(&self.log, |log| {
            log.events.push(FixtureEvent::ReadText {
                url,
                text: text.clone(),
            });
        });
        Ok(text)
    }

    async fn click(&mut self, handle: &FixtureHandle) -> Result<(), ScraperError> {
        tokio::task::yield_now().await;
        self.activate(handle)
    }

    async fn close(self) -> Result<(), ScraperError> {
        record(&self.log, |log| log.pages_closed += 1);
        Ok(())
    }
}

/// Markup builders shaped like the source DOM the default selectors expect.
pub mod markup {
    /// One listing entry with a linked title, price, description, review
    /// counter and `rating` indicator elements.
    #[must_use]
    pub fn listing_entry(id: i64, title: &str, price: &str) -> String {
        format!(
            r#"<div class="thumbnail">
                 <img src="/images/items/{id}.png">
                 <div class="caption">
                   <h4 class="pull-right price">{price}</h4>
                   <h4><a href="/product/{id}" class="title" title="{title}">{title}</a></h4>
                   <p class="description">{title} description</p>
                 </div>
                 <div class="ratings">
                   <p class="pull-right">{id} reviews</p>
                   <p><span class="glyphicon glyphicon-star"></span><span class="glyphicon glyphicon-star"></span></p>
                 </div>
               </div>"#
        )
    }

    #[must_use]
    pub fn listing(entries: &[String]) -> String {
        format!(
            "<html><body><div class=\"row\">{}</div></body></html>",
            entries.concat()
        )
    }

    /// Detail page showing `price` and one variant control per
    /// `(value, enabled)` pair.
    #[must_use]
    pub fn detail(price: &str, controls: &[(&str, bool)]) -> String {
        let buttons: String = controls
            .iter()
            .map(|(value, enabled)| {
                let class = if *enabled { "btn" } else { "btn disabled" };
                format!(r#"<button class="{class}" value="{value}">{value}</button>"#)
            })
            .collect();
        format!(
            r#"<html><body><div class="caption"><h4 class="pull-right price">{price}</h4></div><div class="swatches">{buttons}</div></body></html>"#
        )
    }
}

fn record(log: &Mutex<FixtureLog>, f: impl FnOnce(&mut FixtureLog)) {
    let mut guard = log.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::Query {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

fn resolve<'a>(html: &'a Html, path: &[(String, usize)]) -> Result<ElementRef<'a>, ScraperError> {
    let mut current = html.root_element();
    for (selector, index) in path {
        let parsed = parse_selector(selector)?;
        current = current
            .select(&parsed)
            .nth(*index)
            .ok_or_else(|| ScraperError::Interaction {
                target: describe(path),
                reason: "element is no longer attached to the document".to_string(),
            })?;
    }
    Ok(current)
}

fn describe(path: &[(String, usize)]) -> String {
    path.iter()
        .map(|(selector, index)| format!("{selector}[{index}]"))
        .collect::<Vec<_>>()
        .join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.test/product/1";

    fn site() -> FixtureSite {
        FixtureSite::new()
            .with_page(
                URL,
                r#"<div class="swatches">
                     <button value="128">128</button>
                     <button value="256" disabled>256</button>
                   </div>
                   <p class="price">$10.00</p>"#,
            )
            .with_transition(URL, "128", r#"<p class="price">$12.00</p>"#)
    }

    #[tokio::test]
    async fn navigate_to_unknown_url_fails() {
        let browser = FixtureBrowser::new(site());
        let mut page = browser.open_page().await.unwrap();
        let err = page.navigate("https://shop.test/missing").await.unwrap_err();
        assert!(err.is_navigation(), "got: {err:?}");
    }

    #[tokio::test]
    async fn query_before_navigation_reports_closed_page() {
        let browser = FixtureBrowser::new(site());
        let page = browser.open_page().await.unwrap();
        let err = page.query_all("button").await.unwrap_err();
        assert!(matches!(err, ScraperError::PageClosed));
    }

    #[tokio::test]
    async fn click_applies_transition() {
        let browser = FixtureBrowser::new(site());
        let mut page = browser.open_page().await.unwrap();
        page.navigate(URL).await.unwrap();

        let buttons = page.query_all(".swatches button").await.unwrap();
        assert_eq!(buttons.len(), 2);
        page.click(&buttons[0]).await.unwrap();

        let price = page.query_first(".price").await.unwrap().unwrap();
        assert_eq!(page.read_text(&price).await.unwrap(), "$12.00");
        assert_eq!(browser.log().clicks_on(URL), vec!["128".to_string()]);
    }

    #[tokio::test]
    async fn click_on_disabled_element_fails() {
        let browser = FixtureBrowser::new(site());
        let mut page = browser.open_page().await.unwrap();
        page.navigate(URL).await.unwrap();

        let buttons = page.query_all(".swatches button").await.unwrap();
        let err = page.click(&buttons[1]).await.unwrap_err();
        assert!(err.is_interaction(), "got: {err:?}");
        assert!(browser.log().clicks_on(URL).is_empty());
    }

    #[tokio::test]
    async fn invalid_selector_is_a_query_error() {
        let browser = FixtureBrowser::new(site());
        let mut page = browser.open_page().await.unwrap();
        page.navigate(URL).await.unwrap();
        let err = page.query_all("button[").await.unwrap_err();
        assert!(matches!(err, ScraperError::Query { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn open_close_and_shutdown_are_recorded() {
        let mut browser = FixtureBrowser::new(site());
        let page = browser.open_page().await.unwrap();
        page.close().await.unwrap();
        browser.shutdown().await.unwrap();

        let log = browser.log();
        assert_eq!(log.pages_opened, 1);
        assert_eq!(log.pages_closed, 1);
        assert!(log.shut_down);
    }

    #[tokio::test]
    async fn max_open_pages_tracks_overlap() {
        let browser = FixtureBrowser::new(site());
        let first = browser.open_page().await.unwrap();
        let second = browser.open_page().await.unwrap();
        first.close().await.unwrap();
        let third = browser.open_page().await.unwrap();
        second.close().await.unwrap();
        third.close().await.unwrap();

        assert_eq!(browser.log().max_open_pages, 2);
    }
}
