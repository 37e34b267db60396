//! Database operations for per-user favorite products.

use sqlx::PgPool;
use uuid::Uuid;

use crate::products::ProductRow;
use crate::DbError;

/// Toggles a product in a user's favorites and returns the post-toggle
/// membership: `true` when the product is now a favorite.
///
/// The add path is an `ON CONFLICT DO NOTHING` insert; when that affects
/// no rows the product was already a favorite and gets removed instead.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn toggle_favorite(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<bool, DbError> {
    let inserted = sqlx::query(
        "INSERT INTO favorites (user_id, product_id) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        return Ok(true);
    }

    sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(false)
}

/// Returns a user's favorite products, most recently added first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_favorite_products(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.name, p.category, p.unit, p.created_by, p.created_at, p.updated_at \
         FROM favorites f \
         JOIN products p ON p.id = f.product_id \
         WHERE f.user_id = $1 \
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
