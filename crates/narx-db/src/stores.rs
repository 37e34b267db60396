//! Database operations for the `stores` table. Stores come into existence
//! implicitly: the first price report naming an unknown store creates it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Atomic find-or-create keyed on the case-insensitive name.
///
/// A single upsert against the `LOWER(name)` unique index, so two
/// concurrent submissions of the same new store name resolve to one row
/// (the read-then-write variant raced here). The no-op `DO UPDATE` makes
/// the statement return the existing row on conflict; the first submitted
/// casing wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_store_by_name(
    pool: &PgPool,
    name: &str,
    created_by: Option<Uuid>,
) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "INSERT INTO stores (name, created_by) \
         VALUES ($1, $2) \
         ON CONFLICT ((LOWER(name))) DO UPDATE SET name = stores.name \
         RETURNING id, name, created_by, created_at",
    )
    .bind(name.trim())
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a single store by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store(pool: &PgPool, id: Uuid) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, created_by, created_at FROM stores WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Case-insensitive substring lookup over store names, for submission
/// forms. An empty query lists every store.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_stores(pool: &PgPool, query: &str) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, created_by, created_at \
         FROM stores \
         WHERE ($1 = '' OR name ILIKE '%' || $1 || '%') \
         ORDER BY name",
    )
    .bind(query)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
