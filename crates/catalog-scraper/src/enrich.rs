//! Per-item variant enrichment on detail pages.
//!
//! Each item is driven through an explicit [`EnrichmentState`] machine:
//!
//! ```text
//! Idle -> DetailLoaded -> (Selected -> DetailLoaded) x N -> Done
//! ```
//!
//! A variant's price is only ever read in the `Selected` state, i.e. after
//! its control was clicked and the click returned. Items run concurrently
//! on separate pages; steps within one item never overlap.

use std::collections::VecDeque;
use std::fmt;

use catalog_core::{EnrichedItem, Item, VariantOption};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;

use crate::error::EnrichError;
use crate::normalize::normalize_price;
use crate::selectors::DetailSelectors;
use crate::session::{PageSession, PageSource};

/// Where in an item's enrichment a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichPhase {
    OpenPage,
    LoadDetail,
    EnumerateVariants,
    SelectVariant,
    ReadPrice,
}

impl EnrichPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenPage => "open_page",
            Self::LoadDetail => "load_detail",
            Self::EnumerateVariants => "enumerate_variants",
            Self::SelectVariant => "select_variant",
            Self::ReadPrice => "read_price",
        }
    }
}

impl fmt::Display for EnrichPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item diagnostic. Never fatal to the run.
#[derive(Debug)]
pub struct EnrichmentFailure {
    pub item_id: i64,
    pub phase: EnrichPhase,
    pub error: EnrichError,
}

impl fmt::Display for EnrichmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {} ({}): {}", self.item_id, self.phase, self.error)
    }
}

/// One variant control as discovered on the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantControl {
    /// Raw `value` attribute, used to re-locate the control before clicking.
    pub value: String,
    pub size: i32,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentState {
    Idle,
    /// Detail page loaded; `pending` controls remain in DOM order.
    DetailLoaded { pending: VecDeque<VariantControl> },
    /// `control` has been clicked and its price is ready to read.
    Selected {
        control: VariantControl,
        pending: VecDeque<VariantControl>,
    },
    Done,
}

/// Result of enriching one item. `failures` holds both the fatal failure
/// that ended enrichment early (if any) and skipped-control diagnostics.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub enriched: EnrichedItem,
    pub failures: Vec<EnrichmentFailure>,
    /// `false` when enrichment stopped before reaching [`EnrichmentState::Done`].
    pub completed: bool,
}

/// Drives detail pages to resolve each item's [`VariantOption`]s.
#[derive(Debug, Clone)]
pub struct VariantEnricher {
    detail_url_base: String,
    selectors: DetailSelectors,
}

impl VariantEnricher {
    #[must_use]
    pub fn new(detail_url_base: impl Into<String>, selectors: DetailSelectors) -> Self {
        Self {
            detail_url_base: detail_url_base.into(),
            selectors,
        }
    }

    /// Canonical detail page of item `id`.
    #[must_use]
    pub fn detail_url(&self, id: i64) -> String {
        format!("{}/{id}", self.detail_url_base.trim_end_matches('/'))
    }

    /// Enriches every item, at most `max_concurrent` pages at a time.
    /// Outcomes come back in input order.
    pub async fn enrich_all<S: PageSource>(
        &self,
        source: &S,
        items: Vec<Item>,
        max_concurrent: usize,
    ) -> Vec<EnrichmentOutcome> {
        stream::iter(items)
            .map(|item| self.enrich(source, item))
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    /// Enriches one item on a page of its own. Failures are recorded on the
    /// outcome; the item is always returned with whatever variants resolved
    /// before the failure, and the page is always closed.
    pub async fn enrich<S: PageSource>(&self, source: &S, item: Item) -> EnrichmentOutcome {
        let item_id = item.id;
        let mut variants = Vec::new();
        let mut failures = Vec::new();

        let mut page = match source.open_page().await {
            Ok(page) => page,
            Err(e) => {
                let failure = EnrichmentFailure {
                    item_id,
                    phase: EnrichPhase::OpenPage,
                    error: e.into(),
                };
                log_failure(&failure);
                failures.push(failure);
                return EnrichmentOutcome {
                    enriched: EnrichedItem::bare(item),
                    failures,
                    completed: false,
                };
            }
        };

        let mut state = EnrichmentState::Idle;
        let completed = loop {
            if state == EnrichmentState::Done {
                break true;
            }
            match self
                .step(&mut page, item_id, state, &mut variants, &mut failures)
                .await
            {
                Ok(next) => state = next,
                Err(failure) => {
                    log_failure(&failure);
                    failures.push(failure);
                    break false;
                }
            }
        };

        if let Err(e) = page.close().await {
            tracing::warn!(item_id, error = %e, "failed to close detail page");
        }

        tracing::debug!(
            item_id,
            variants = variants.len(),
            completed,
            "item enrichment finished"
        );

        EnrichmentOutcome {
            enriched: EnrichedItem { item, variants },
            failures,
            completed,
        }
    }

    /// Advances one item by a single transition.
    ///
    /// Resolved variants are appended to `variants`; non-fatal diagnostics
    /// go to `notes`. An `Err` ends enrichment of the item.
    pub(crate) async fn step<P: PageSession>(
        &self,
        page: &mut P,
        item_id: i64,
        state: EnrichmentState,
        variants: &mut Vec<VariantOption>,
        notes: &mut Vec<EnrichmentFailure>,
    ) -> Result<EnrichmentState, EnrichmentFailure> {
        let fail = |phase: EnrichPhase, error: EnrichError| EnrichmentFailure {
            item_id,
            phase,
            error,
        };

        match state {
            EnrichmentState::Idle => {
                let url = self.detail_url(item_id);
                page.navigate(&url)
                    .await
                    .map_err(|e| fail(EnrichPhase::LoadDetail, e.into()))?;
                let pending = self
                    .enumerate(page, item_id, notes)
                    .await
                    .map_err(|e| fail(EnrichPhase::EnumerateVariants, e))?;
                Ok(EnrichmentState::DetailLoaded { pending })
            }
            EnrichmentState::DetailLoaded { mut pending } => {
                let Some(control) = pending.pop_front() else {
                    return Ok(EnrichmentState::Done);
                };
                if !control.enabled {
                    variants.push(VariantOption {
                        item_id,
                        size: control.size,
                        enabled: false,
                        price: None,
                    });
                    return Ok(EnrichmentState::DetailLoaded { pending });
                }

                let target = page
                    .query_first(&self.selectors.control_with_value(&control.value))
                    .await
                    .map_err(|e| fail(EnrichPhase::SelectVariant, e.into()))?
                    .ok_or_else(|| {
                        fail(
                            EnrichPhase::SelectVariant,
                            EnrichError::ControlMissing {
                                value: control.value.clone(),
                            },
                        )
                    })?;
                page.click(&target)
                    .await
                    .map_err(|e| fail(EnrichPhase::SelectVariant, e.into()))?;
                Ok(EnrichmentState::Selected { control, pending })
            }
            EnrichmentState::Selected { control, pending } => {
                let price = self
                    .read_price(page)
                    .await
                    .map_err(|e| fail(EnrichPhase::ReadPrice, e))?;
                variants.push(VariantOption {
                    item_id,
                    size: control.size,
                    enabled: true,
                    price: Some(price),
                });
                Ok(EnrichmentState::DetailLoaded { pending })
            }
            EnrichmentState::Done => Ok(EnrichmentState::Done),
        }
    }

    async fn enumerate<P: PageSession>(
        &self,
        page: &P,
        item_id: i64,
        notes: &mut Vec<EnrichmentFailure>,
    ) -> Result<VecDeque<VariantControl>, EnrichError> {
        let handles = page.query_all(&self.selectors.variant_control).await?;
        let mut controls = VecDeque::with_capacity(handles.len());

        for handle in &handles {
            let value = page
                .read_attribute(handle, "value")
                .await?
                .unwrap_or_default();
            let Some(size) = parse_size(&value) else {
                let failure = EnrichmentFailure {
                    item_id,
                    phase: EnrichPhase::EnumerateVariants,
                    error: EnrichError::InvalidSize { value },
                };
                log_failure(&failure);
                notes.push(failure);
                continue;
            };
            let class = page.read_attribute(handle, "class").await?;
            let disabled_attr = page.read_attribute(handle, "disabled").await?;
            let enabled = disabled_attr.is_none() && !has_class(class.as_deref(), "disabled");
            controls.push_back(VariantControl {
                value,
                size,
                enabled,
            });
        }

        Ok(controls)
    }

    async fn read_price<P: PageSession>(&self, page: &P) -> Result<Decimal, EnrichError> {
        let el = page
            .query_first(&self.selectors.price)
            .await?
            .ok_or(EnrichError::PriceMissing)?;
        let text = page.read_text(&el).await?;
        normalize_price(&text).ok_or(EnrichError::UnreadablePrice { text })
    }
}

fn parse_size(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|size| *size > 0)
}

fn has_class(class: Option<&str>, name: &str) -> bool {
    class.is_some_and(|c| c.split_whitespace().any(|token| token == name))
}

fn log_failure(failure: &EnrichmentFailure) {
    tracing::warn!(
        item_id = failure.item_id,
        phase = %failure.phase,
        error = %failure.error,
        "item enrichment failed"
    );
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod tests;
