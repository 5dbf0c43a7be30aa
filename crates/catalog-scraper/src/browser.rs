//! Chromium-backed [`PageSource`] via the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::ScraperError;
use crate::session::{PageSession, PageSource};

/// Launch and interaction settings for [`ChromiumBrowser`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub no_sandbox: bool,
    pub navigation_timeout_secs: u64,
    /// Delay after a click before the page is considered settled.
    pub settle_ms: u64,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_app_config(config: &catalog_core::AppConfig) -> Self {
        Self {
            headless: config.browser_headless,
            executable: config.browser_executable.clone(),
            no_sandbox: config.browser_no_sandbox,
            navigation_timeout_secs: config.browser_nav_timeout_secs,
            settle_ms: config.browser_settle_ms,
        }
    }
}

/// A launched Chromium process plus the task pumping its CDP event stream.
pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    options: BrowserOptions,
}

impl ChromiumBrowser {
    /// Launches Chromium with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the configuration is rejected or
    /// the browser process cannot be started.
    pub async fn launch(options: BrowserOptions) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(options.navigation_timeout_secs));
        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|reason| ScraperError::Launch { reason })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ScraperError::Launch {
                    reason: e.to_string(),
                })?;

        // The handler stream must be polled for any CDP command to complete.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        tracing::info!(headless = options.headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
            options,
        })
    }
}

#[async_trait]
impl PageSource for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn open_page(&self) -> Result<ChromiumPage, ScraperError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Navigation {
                url: "about:blank".to_string(),
                reason: e.to_string(),
            })?;
        Ok(ChromiumPage {
            page,
            navigation_timeout: Duration::from_secs(self.options.navigation_timeout_secs),
            settle: Duration::from_millis(self.options.settle_ms),
        })
    }

    async fn shutdown(&mut self) -> Result<(), ScraperError> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!(error = %e, "browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed.map(|_| ()).map_err(|e| ScraperError::Launch {
            reason: format!("failed to close browser: {e}"),
        })
    }
}

pub struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
    settle: Duration,
}

#[async_trait]
impl PageSession for ChromiumPage {
    type Handle = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScraperError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: self.navigation_timeout.as_secs(),
            }),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, ScraperError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn query_within(
        &self,
        scope: &Element,
        selector: &str,
    ) -> Result<Vec<Element>, ScraperError> {
        scope
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn read_attribute(
        &self,
        handle: &Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        handle
            .attribute(name)
            .await
            .map_err(|e| ScraperError::Interaction {
                target: format!("attribute '{name}'"),
                reason: e.to_string(),
            })
    }

    async fn read_text(&self, handle: &Element) -> Result<String, ScraperError> {
        let text = handle
            .inner_text()
            .await
            .map_err(|e| ScraperError::Interaction {
                target: "element text".to_string(),
                reason: e.to_string(),
            })?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn click(&mut self, handle: &Element) -> Result<(), ScraperError> {
        handle
            .click()
            .await
            .map_err(|e| ScraperError::Interaction {
                target: "element".to_string(),
                reason: e.to_string(),
            })?;
        // The click resolves once the input event is dispatched; the page's
        // own handlers update the DOM afterwards.
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }

    async fn close(self) -> Result<(), ScraperError> {
        self.page.close().await.map_err(|e| ScraperError::Interaction {
            target: "page".to_string(),
            reason: format!("failed to close: {e}"),
        })
    }
}
