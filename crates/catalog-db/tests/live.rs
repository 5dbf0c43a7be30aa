//! Live integration tests for catalog-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/catalog-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. They need `DATABASE_URL` and are ignored by default:
//! run with `cargo test -p catalog-db -- --ignored`.

use catalog_core::{Item, VariantOption};
use catalog_db::{
    commit_catalog, count_items, get_item, list_variant_options, ping, CatalogRepository,
    PgCatalogRepository,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_item(id: i64, price_cents: i64) -> Item {
    Item {
        id,
        title: format!("Lenovo ThinkPad {id}"),
        url: format!("/test-sites/e-commerce/allinone/product/{id}"),
        image: format!("https://shop.test/images/{id}.png"),
        price: Decimal::new(price_cents, 2),
        description: "14\" FHD".to_string(),
        review_count: 7,
        review_score: 4,
    }
}

fn make_variant(item_id: i64, size: i32, price_cents: Option<i64>) -> VariantOption {
    VariantOption {
        item_id,
        size,
        enabled: price_cents.is_some(),
        price: price_cents.map(|c| Decimal::new(c, 2)),
    }
}

// ---------------------------------------------------------------------------
// Upsert semantics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn commit_writes_items_and_variants(pool: sqlx::PgPool) {
    let written = commit_catalog(
        &pool,
        &[make_item(548, 110_183)],
        &[
            make_variant(548, 128, Some(110_183)),
            make_variant(548, 1024, None),
        ],
    )
    .await
    .expect("commit_catalog failed");

    assert_eq!(written, 3);

    let item = get_item(&pool, 548)
        .await
        .expect("get_item failed")
        .expect("item 548 should exist");
    assert_eq!(item.price, Decimal::new(110_183, 2));
    assert_eq!(item.reviews_qty, 7);

    let variants = list_variant_options(&pool, 548)
        .await
        .expect("list_variant_options failed");
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].size, 128);
    assert_eq!(variants[1].price, None);
    assert!(!variants[1].enabled);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn recommit_is_idempotent_and_updates_in_place(pool: sqlx::PgPool) {
    let items = [make_item(1, 10_000)];
    let variants = [make_variant(1, 256, Some(12_000))];

    commit_catalog(&pool, &items, &variants)
        .await
        .expect("first commit failed");
    let first = list_variant_options(&pool, 1).await.expect("list failed");

    commit_catalog(
        &pool,
        &[make_item(1, 9_000)],
        &[make_variant(1, 256, Some(11_000))],
    )
    .await
    .expect("second commit failed");

    assert_eq!(count_items(&pool).await.expect("count failed"), 1);
    let second = list_variant_options(&pool, 1).await.expect("list failed");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id, "variant row must be updated in place");
    assert_eq!(second[0].price, Some(Decimal::new(11_000, 2)));

    let item = get_item(&pool, 1).await.expect("get failed").expect("missing");
    assert_eq!(item.price, Decimal::new(9_000, 2));
    assert!(item.updated_at >= item.created_at);
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failing_row_rolls_back_whole_batch(pool: sqlx::PgPool) {
    // Variant for item 99 violates the foreign key; items 1 and 2 must not land.
    let err = commit_catalog(
        &pool,
        &[make_item(1, 100), make_item(2, 200)],
        &[make_variant(99, 128, Some(100))],
    )
    .await
    .expect_err("commit should fail on the orphan variant");

    assert!(matches!(err, catalog_db::DbError::Sqlx(_)));
    assert_eq!(count_items(&pool).await.expect("count failed"), 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn empty_batch_writes_nothing(pool: sqlx::PgPool) {
    let written = commit_catalog(&pool, &[], &[])
        .await
        .expect("empty commit failed");
    assert_eq!(written, 0);
    assert_eq!(count_items(&pool).await.expect("count failed"), 0);
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn pg_repository_commits_and_closes(pool: sqlx::PgPool) {
    let repo = PgCatalogRepository::new(pool.clone());

    let written = repo
        .commit(&[make_item(5, 500)], &[make_variant(5, 512, Some(550))])
        .await
        .expect("repository commit failed");
    assert_eq!(written, 2);
    assert_eq!(count_items(repo.pool()).await.expect("count failed"), 1);

    repo.close().await;
    repo.close().await;
    assert!(pool.is_closed());
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ping_succeeds_on_live_pool(pool: sqlx::PgPool) {
    ping(&pool).await.expect("ping failed");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ping_fails_on_closed_pool(pool: sqlx::PgPool) {
    pool.close().await;
    assert!(ping(&pool).await.is_err());
}
