//! Database operations for `items` and `item_variant_options`.

use catalog_core::{Item, VariantOption};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub image: String,
    pub price: Decimal,
    pub description: String,
    pub reviews_qty: i32,
    pub review_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            image: row.image,
            price: row.price,
            description: row.description,
            review_count: row.reviews_qty,
            review_score: row.review_score,
        }
    }
}

/// A row from the `item_variant_options` table.
///
/// `price` is `NULL` for disabled variants.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantOptionRow {
    pub id: i64,
    pub item_id: i64,
    pub size: i32,
    pub enabled: bool,
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VariantOptionRow> for VariantOption {
    fn from(row: VariantOptionRow) -> Self {
        Self {
            item_id: row.item_id,
            size: row.size,
            enabled: row.enabled,
            price: row.price,
        }
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Upserts an item row on its primary key.
///
/// Conflicts on `id` overwrite every data column and bump `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_item(conn: &mut PgConnection, item: &Item) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO items \
             (id, title, url, image, price, description, reviews_qty, review_score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (id) DO UPDATE SET \
             title        = EXCLUDED.title, \
             url          = EXCLUDED.url, \
             image        = EXCLUDED.image, \
             price        = EXCLUDED.price, \
             description  = EXCLUDED.description, \
             reviews_qty  = EXCLUDED.reviews_qty, \
             review_score = EXCLUDED.review_score, \
             updated_at   = NOW() \
         RETURNING id",
    )
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.image)
    .bind(item.price)
    .bind(&item.description)
    .bind(item.review_count)
    .bind(item.review_score)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Upserts a variant option on `(item_id, size)`.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when the parent
/// item does not exist.
pub async fn upsert_variant_option(
    conn: &mut PgConnection,
    variant: &VariantOption,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO item_variant_options (item_id, size, enabled, price) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (item_id, size) DO UPDATE SET \
             enabled    = EXCLUDED.enabled, \
             price      = EXCLUDED.price, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(variant.item_id)
    .bind(variant.size)
    .bind(variant.enabled)
    .bind(variant.price)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Upserts every item, then every variant option, in one transaction.
///
/// Returns the number of rows written. If any statement fails the
/// transaction is rolled back and nothing from this call is visible. An
/// empty batch returns `0` without touching the database.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn commit_catalog(
    pool: &PgPool,
    items: &[Item],
    variants: &[VariantOption],
) -> Result<u64, DbError> {
    if items.is_empty() && variants.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    for item in items {
        upsert_item(&mut tx, item).await?;
    }
    for variant in variants {
        upsert_variant_option(&mut tx, variant).await?;
    }

    tx.commit().await?;

    let written = u64::try_from(items.len() + variants.len()).unwrap_or(u64::MAX);
    tracing::debug!(
        items = items.len(),
        variants = variants.len(),
        "catalog batch committed"
    );
    Ok(written)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches one item by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_item(pool: &PgPool, id: i64) -> Result<Option<ItemRow>, DbError> {
    let row = sqlx::query_as::<_, ItemRow>(
        "SELECT id, title, url, image, price, description, reviews_qty, review_score, \
                created_at, updated_at \
         FROM items \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists the variant options of an item, ordered by size.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variant_options(
    pool: &PgPool,
    item_id: i64,
) -> Result<Vec<VariantOptionRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantOptionRow>(
        "SELECT id, item_id, size, enabled, price, created_at, updated_at \
         FROM item_variant_options \
         WHERE item_id = $1 \
         ORDER BY size",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total number of stored items.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_items(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
