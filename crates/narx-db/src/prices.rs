//! Database operations for the `prices` table (user-submitted price
//! reports). Reports are immutable once created except for deletion; the
//! normalized price is computed at submission time and never edited.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `prices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    /// Raw submitted price, integer base-currency amount.
    pub price: i64,
    pub currency: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Price per base unit; `NULL` when normalization was skipped.
    pub normalized_price: Option<i64>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A price report joined with its store name, for product history views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: Uuid,
    pub price: i64,
    pub currency: String,
    pub quantity: Decimal,
    pub unit: String,
    pub normalized_price: Option<i64>,
    pub store_name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A recent price report joined with product and store context, feeding
/// the recent-activity feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentPriceRow {
    pub price_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: String,
    pub product_unit: String,
    pub price: i64,
    pub normalized_price: Option<i64>,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a new price report. `normalized_price` must come from
/// `narx_core::units::normalize` over the same price/quantity/unit.
#[derive(Debug, Clone)]
pub struct NewPrice<'a> {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub price: i64,
    pub currency: &'a str,
    pub quantity: Decimal,
    pub unit: &'a str,
    pub normalized_price: Option<i64>,
    pub created_by: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a price report.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_price(pool: &PgPool, price: &NewPrice<'_>) -> Result<PriceRow, DbError> {
    let row = sqlx::query_as::<_, PriceRow>(
        "INSERT INTO prices \
             (product_id, store_id, price, currency, quantity, unit, normalized_price, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, product_id, store_id, price, currency, quantity, unit, \
                   normalized_price, created_by, created_at",
    )
    .bind(price.product_id)
    .bind(price.store_id)
    .bind(price.price)
    .bind(price.currency)
    .bind(price.quantity)
    .bind(price.unit)
    .bind(price.normalized_price)
    .bind(price.created_by)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a product's full report history in insertion order (oldest
/// first). The aggregator relies on this order to break timestamp ties in
/// favor of the most recent insertion.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prices_for_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<PriceHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceHistoryRow>(
        "SELECT pr.id, pr.price, pr.currency, pr.quantity, pr.unit, pr.normalized_price, \
                s.name AS store_name, pr.created_by, pr.created_at \
         FROM prices pr \
         JOIN stores s ON s.id = pr.store_id \
         WHERE pr.product_id = $1 \
         ORDER BY pr.created_at ASC, pr.id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recent reports system-wide with product and store
/// context, newest first. Ties on timestamp resolve by `id DESC` so the
/// order is stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_prices(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RecentPriceRow>, DbError> {
    let rows = sqlx::query_as::<_, RecentPriceRow>(
        "SELECT pr.id AS price_id, p.id AS product_id, p.name AS product_name, \
                p.category AS product_category, p.unit AS product_unit, \
                pr.price, pr.normalized_price, s.name AS store_name, pr.created_at \
         FROM prices pr \
         JOIN products p ON p.id = pr.product_id \
         JOIN stores s ON s.id = pr.store_id \
         ORDER BY pr.created_at DESC, pr.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a price report. The report drops out of every aggregate on the
/// next read; nothing is recomputed eagerly.
///
/// # Errors
///
/// Returns [`DbError::PermissionDenied`] when no row was deleted, or
/// [`DbError::Sqlx`] if the statement fails.
pub async fn delete_price(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let done = sqlx::query("DELETE FROM prices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::PermissionDenied);
    }
    Ok(())
}
