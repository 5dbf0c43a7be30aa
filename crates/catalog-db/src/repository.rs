//! The persistence seam the ingestion pipeline writes through.

use async_trait::async_trait;
use catalog_core::{Item, VariantOption};
use sqlx::PgPool;

use crate::{items, DbError};

/// Atomic, idempotent batch writer for catalog rows.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Upserts `items` on `id` and `variants` on `(item_id, size)` as one
    /// unit: either every row lands or none does.
    ///
    /// Returns the number of rows written.
    async fn commit(&self, items: &[Item], variants: &[VariantOption]) -> Result<u64, DbError>;

    /// Releases any held connections. Safe to call more than once.
    async fn close(&self);
}

/// [`CatalogRepository`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn commit(&self, items: &[Item], variants: &[VariantOption]) -> Result<u64, DbError> {
        items::commit_catalog(&self.pool, items, variants).await
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::debug!("database pool closed");
        }
    }
}
