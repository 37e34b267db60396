//! Per-user contribution counts, read independently so callers can issue
//! them concurrently and join the results for a reputation score.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Number of products this user created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE created_by = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Number of price reports this user submitted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_prices_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prices WHERE created_by = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
