//! In-process [`CatalogRepository`] with the same upsert and atomicity
//! semantics as the Postgres one.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use catalog_core::{Item, VariantOption};

use crate::repository::CatalogRepository;
use crate::DbError;

#[derive(Debug, Clone, Default)]
struct Tables {
    items: BTreeMap<i64, Item>,
    variants: BTreeMap<(i64, i32), VariantOption>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    commits: usize,
    closed: bool,
    /// Fail the next commit after this many rows have been staged.
    fail_after_rows: Option<usize>,
}

/// Keeps rows in ordered maps keyed like the SQL unique constraints.
///
/// A commit stages its rows on a copy of the tables and swaps the copy in
/// only if every row applied.
#[derive(Debug, Default)]
pub struct MemoryCatalogRepository {
    state: Mutex<State>,
}

impl MemoryCatalogRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail once `rows` rows have been staged.
    pub fn fail_next_commit_after(&self, rows: usize) {
        self.lock().fail_after_rows = Some(rows);
    }

    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.lock().tables.items.values().cloned().collect()
    }

    #[must_use]
    pub fn item(&self, id: i64) -> Option<Item> {
        self.lock().tables.items.get(&id).cloned()
    }

    /// Variant options of `item_id`, ordered by size.
    #[must_use]
    pub fn variants_for(&self, item_id: i64) -> Vec<VariantOption> {
        self.lock()
            .tables
            .variants
            .range((item_id, i32::MIN)..=(item_id, i32::MAX))
            .map(|(_, v)| v.clone())
            .collect()
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.lock().tables.variants.len()
    }

    /// Number of commits that reached the store.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn commit(&self, items: &[Item], variants: &[VariantOption]) -> Result<u64, DbError> {
        if items.is_empty() && variants.is_empty() {
            return Ok(0);
        }

        let mut state = self.lock();
        let fail_after = state.fail_after_rows.take();
        let mut staged = state.tables.clone();
        let mut written = 0usize;

        let check_injection = |written: usize| match fail_after {
            Some(limit) if written >= limit => Err(DbError::Injected(format!(
                "commit aborted after {written} staged rows"
            ))),
            _ => Ok(()),
        };

        for item in items {
            check_injection(written)?;
            staged.items.insert(item.id, item.clone());
            written += 1;
        }
        for variant in variants {
            check_injection(written)?;
            if !staged.items.contains_key(&variant.item_id) {
                return Err(DbError::MissingParentItem {
                    item_id: variant.item_id,
                    size: variant.size,
                });
            }
            staged
                .variants
                .insert((variant.item_id, variant.size), variant.clone());
            written += 1;
        }

        state.tables = staged;
        state.commits += 1;
        Ok(u64::try_from(written).unwrap_or(u64::MAX))
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
