//! Demo-data seeding for local development. Idempotent: reruns skip
//! existing stores/products and only add fresh price history.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SEED_STORES: [&str; 6] = [
    "Корзинка",
    "Макро",
    "Хавас",
    "Чорсу Базар",
    "Эко Базар",
    "Алайский",
];

/// (name, category, unit, sample price for 1 unit)
const SEED_PRODUCTS: [(&str, &str, &str, i64); 5] = [
    ("Картофель", "Овощи", "кг", 4500),
    ("Помидоры", "Овощи", "кг", 12_000),
    ("Молоко", "Молочные продукты", "л", 11_000),
    ("Хлеб", "Хлеб", "шт", 3500),
    ("Яблоки", "Фрукты", "кг", 15_000),
];

/// Seeds demo stores, products, and a short price history for each
/// product. All inserts run inside a single transaction; if any operation
/// fails the entire batch is rolled back.
///
/// Returns the number of price reports inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_data(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut store_ids = Vec::with_capacity(SEED_STORES.len());

    for name in SEED_STORES {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO stores (name) VALUES ($1) \
             ON CONFLICT ((LOWER(name))) DO UPDATE SET name = stores.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        store_ids.push(id);
    }

    let mut reports = 0usize;
    for (index, (name, category, unit, base_price)) in SEED_PRODUCTS.into_iter().enumerate() {
        let product_id: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO products (name, category, unit) VALUES ($1, $2, $3) \
             ON CONFLICT ((LOWER(name))) DO NOTHING \
             RETURNING id",
        )
        .bind(name)
        .bind(category)
        .bind(unit)
        .fetch_optional(&mut *tx)
        .await?;

        // Already seeded on a previous run; leave its history alone.
        let Some(product_id) = product_id else {
            continue;
        };

        // Three reports spread over the last ten days at different stores,
        // drifting a few percent around the sample price.
        for step in 0..3u32 {
            let store_id = store_ids[(index + step as usize) % store_ids.len()];
            let price = base_price + i64::from(step) * (base_price / 20);
            let quantity = Decimal::from(1);
            let normalized = narx_core::normalize(Decimal::from(price), quantity, unit);

            sqlx::query(
                "INSERT INTO prices \
                     (product_id, store_id, price, currency, quantity, unit, normalized_price, created_at) \
                 VALUES ($1, $2, $3, 'UZS', $4, $5, $6, NOW() - ($7 || ' days')::interval)",
            )
            .bind(product_id)
            .bind(store_id)
            .bind(price)
            .bind(quantity)
            .bind(unit)
            .bind(normalized)
            .bind(i64::from(step * 5).to_string())
            .execute(&mut *tx)
            .await?;
            reports += 1;
        }
    }

    tx.commit().await?;
    Ok(reports)
}
