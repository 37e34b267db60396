//! Live integration tests for narx-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/narx-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use rust_decimal::Decimal;
use uuid::Uuid;

use narx_db::{
    delete_price, delete_product, get_product, insert_price, insert_product,
    list_favorite_products, list_prices_for_product, list_products_by_store, list_recent_prices,
    search_products, toggle_favorite, upsert_store_by_name, DbError, NewPrice, ProductSearch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_product(pool: &sqlx::PgPool, name: &str) -> Uuid {
    insert_product(pool, name, "Овощи", "кг", None)
        .await
        .unwrap_or_else(|e| panic!("insert_test_product failed for '{name}': {e}"))
        .id
}

async fn submit_test_price(pool: &sqlx::PgPool, product_id: Uuid, store: &str, price: i64) -> Uuid {
    let store = upsert_store_by_name(pool, store, None)
        .await
        .expect("upsert store");
    let quantity = Decimal::from(1);
    let report = NewPrice {
        product_id,
        store_id: store.id,
        price,
        currency: "UZS",
        quantity,
        unit: "кг",
        normalized_price: narx_core::normalize(Decimal::from(price), quantity, "кг"),
        created_by: None,
    };
    insert_price(pool, &report).await.expect("insert price").id
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_product_rejects_case_insensitive_duplicate(pool: sqlx::PgPool) {
    insert_test_product(&pool, "картофель").await;

    let err = insert_product(&pool, "Картофель", "Овощи", "кг", None)
        .await
        .expect_err("duplicate should be rejected");
    assert!(
        matches!(err, DbError::DuplicateProductName(ref name) if name == "Картофель"),
        "expected DuplicateProductName, got: {err:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_substring_case_insensitively(pool: sqlx::PgPool) {
    insert_test_product(&pool, "Картофель").await;
    insert_test_product(&pool, "Молодой картофель").await;
    insert_test_product(&pool, "Морковь").await;

    let page = search_products(
        &pool,
        ProductSearch {
            query: "картоф",
            category: None,
            limit: 10,
            offset: 0,
        },
    )
    .await
    .expect("search");

    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_pagination_reports_full_total(pool: sqlx::PgPool) {
    for i in 0..5 {
        insert_test_product(&pool, &format!("Продукт {i}")).await;
    }

    let page = search_products(
        &pool,
        ProductSearch {
            query: "продукт",
            category: None,
            limit: 2,
            offset: 4,
        },
    )
    .await
    .expect("search");

    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_product_cascades_to_prices(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Картофель").await;
    submit_test_price(&pool, product_id, "Корзинка", 4500).await;
    submit_test_price(&pool, product_id, "Макро", 5000).await;

    let removed = delete_product(&pool, product_id).await.expect("delete");
    assert_eq!(removed, 2);
    assert!(get_product(&pool, product_id).await.expect("get").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_missing_product_is_permission_denied(pool: sqlx::PgPool) {
    let err = delete_product(&pool, Uuid::new_v4())
        .await
        .expect_err("missing product");
    assert!(matches!(err, DbError::PermissionDenied));
}

// ---------------------------------------------------------------------------
// Stores & prices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn store_find_or_create_is_case_insensitive(pool: sqlx::PgPool) {
    let first = upsert_store_by_name(&pool, "Корзинка", None)
        .await
        .expect("create");
    let second = upsert_store_by_name(&pool, "корзинка", None)
        .await
        .expect("find");

    assert_eq!(first.id, second.id);
    // First submitted casing wins.
    assert_eq!(second.name, "Корзинка");
}

#[sqlx::test(migrations = "../../migrations")]
async fn price_history_comes_back_in_insertion_order(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Картофель").await;
    submit_test_price(&pool, product_id, "Корзинка", 4500).await;
    submit_test_price(&pool, product_id, "Макро", 5000).await;

    let history = list_prices_for_product(&pool, product_id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].price, 4500);
    assert_eq!(history[1].price, 5000);
    assert_eq!(history[0].normalized_price, Some(4500));
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_sole_report_empties_aggregates_on_next_read(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Картофель").await;
    let price_id = submit_test_price(&pool, product_id, "Корзинка", 4500).await;

    delete_price(&pool, price_id).await.expect("delete price");

    let history = list_prices_for_product(&pool, product_id)
        .await
        .expect("history");
    let observations: Vec<narx_core::ReportObservation> = history
        .iter()
        .map(|r| narx_core::ReportObservation {
            price: r.price,
            normalized_price: r.normalized_price,
            observed_at: r.created_at,
        })
        .collect();
    let view = narx_core::aggregate(&observations, chrono::Utc::now());

    assert_eq!(view.min_price, None);
    assert_eq!(view.max_price, None);
    assert_eq!(view.monthly_average, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn recent_prices_are_newest_first(pool: sqlx::PgPool) {
    let a = insert_test_product(&pool, "Продукт А").await;
    let b = insert_test_product(&pool, "Продукт Б").await;
    submit_test_price(&pool, a, "Корзинка", 100).await;
    submit_test_price(&pool, b, "Корзинка", 200).await;
    submit_test_price(&pool, a, "Макро", 300).await;

    let recent = list_recent_prices(&pool, 10).await.expect("recent");
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].price, 300);
    assert_eq!(recent[0].product_id, a);
    assert_eq!(recent[1].product_id, b);
}

#[sqlx::test(migrations = "../../migrations")]
async fn products_by_store_lists_reported_products_once(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Картофель").await;
    submit_test_price(&pool, product_id, "Корзинка", 4500).await;
    submit_test_price(&pool, product_id, "Корзинка", 4700).await;

    let store = upsert_store_by_name(&pool, "Корзинка", None)
        .await
        .expect("store");
    let products = list_products_by_store(&pool, store.id)
        .await
        .expect("by store");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, product_id);
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn favorite_toggle_round_trips(pool: sqlx::PgPool) {
    let user_id = Uuid::new_v4();
    let product_id = insert_test_product(&pool, "Картофель").await;

    assert!(toggle_favorite(&pool, user_id, product_id).await.expect("add"));
    let favorites = list_favorite_products(&pool, user_id).await.expect("list");
    assert_eq!(favorites.len(), 1);

    assert!(!toggle_favorite(&pool, user_id, product_id).await.expect("remove"));
    let favorites = list_favorite_products(&pool, user_id).await.expect("list");
    assert!(favorites.is_empty());
}
