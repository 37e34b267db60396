//! Database operations for the `products` table, including the cascading
//! delete of a product's price history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    /// One of the fixed category labels; validated against
    /// `narx_core::ProductCategory` before any write.
    pub category: String,
    /// Canonical unit the product is usually sold in (e.g. `кг`, `л`, `шт`).
    pub unit: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for a paginated catalog search.
#[derive(Debug, Clone, Default)]
pub struct ProductSearch<'a> {
    /// Case-insensitive substring match on name; empty matches everything.
    pub query: &'a str,
    pub category: Option<&'a str>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of search results plus the total match count, so callers can
/// keep issuing load-more pages.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductRow>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a product, rejecting names that already exist in any casing.
///
/// # Errors
///
/// Returns [`DbError::DuplicateProductName`] on a case-insensitive name
/// collision, [`DbError::Sqlx`] for any other failure.
pub async fn insert_product(
    pool: &PgPool,
    name: &str,
    category: &str,
    unit: &str,
    created_by: Option<Uuid>,
) -> Result<ProductRow, DbError> {
    let result = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (name, category, unit, created_by) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, category, unit, created_by, created_at, updated_at",
    )
    .bind(name)
    .bind(category)
    .bind(unit)
    .bind(created_by)
    .fetch_one(pool)
    .await;

    result.map_err(|e| {
        if crate::is_unique_violation(&e, "products_name_lower_key") {
            DbError::DuplicateProductName(name.to_string())
        } else {
            DbError::Sqlx(e)
        }
    })
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, unit, created_by, created_at, updated_at \
         FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Free-text catalog search with optional category filter and pagination.
///
/// Matching is a case-insensitive substring match on name. The total count
/// uses the same filters so pagination state stays consistent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn search_products(
    pool: &PgPool,
    search: ProductSearch<'_>,
) -> Result<ProductPage, DbError> {
    let items = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, unit, created_by, created_at, updated_at \
         FROM products \
         WHERE ($1 = '' OR name ILIKE '%' || $1 || '%') \
           AND ($2::TEXT IS NULL OR category = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(search.query)
    .bind(search.category)
    .bind(search.limit)
    .bind(search.offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products \
         WHERE ($1 = '' OR name ILIKE '%' || $1 || '%') \
           AND ($2::TEXT IS NULL OR category = $2)",
    )
    .bind(search.query)
    .bind(search.category)
    .fetch_one(pool)
    .await?;

    Ok(ProductPage { items, total })
}

/// Updates a product's name and/or category; `None` keeps the current value.
///
/// # Errors
///
/// Returns [`DbError::PermissionDenied`] when no row was updated,
/// [`DbError::DuplicateProductName`] when the new name collides
/// case-insensitively, or [`DbError::Sqlx`] for any other failure.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    category: Option<&str>,
) -> Result<ProductRow, DbError> {
    let result = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET name       = COALESCE($2, name), \
             category   = COALESCE($3, category), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, name, category, unit, created_by, created_at, updated_at",
    )
    .bind(id)
    .bind(name)
    .bind(category)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(DbError::PermissionDenied),
        Err(e) if crate::is_unique_violation(&e, "products_name_lower_key") => Err(
            DbError::DuplicateProductName(name.unwrap_or_default().to_string()),
        ),
        Err(e) => Err(DbError::Sqlx(e)),
    }
}

/// Deletes a product and its entire price history.
///
/// The cascade is explicit and not transactional: prices are deleted
/// first, then the product, and the product delete's row count is
/// verified. If the second step fails the product is left orphaned with
/// no history; that state is logged and surfaced, never rolled back.
///
/// Returns the number of price reports that were removed.
///
/// # Errors
///
/// Returns [`DbError::PermissionDenied`] when the product delete affected
/// no rows, or [`DbError::Sqlx`] if either statement fails.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<u64, DbError> {
    let prices_removed = sqlx::query("DELETE FROM prices WHERE product_id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() > 0 => Ok(prices_removed),
        Ok(_) => {
            if prices_removed > 0 {
                tracing::error!(product_id = %id, prices_removed, "product delete affected no rows after its prices were removed");
            }
            Err(DbError::PermissionDenied)
        }
        Err(e) => {
            if prices_removed > 0 {
                tracing::error!(product_id = %id, prices_removed, error = %e, "product left orphaned: price history deleted but product delete failed");
            }
            Err(DbError::Sqlx(e))
        }
    }
}

/// Returns every product with at least one price report at the store,
/// most recently updated first. No pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_store(
    pool: &PgPool,
    store_id: Uuid,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT DISTINCT ON (p.id) \
             p.id, p.name, p.category, p.unit, p.created_by, p.created_at, p.updated_at \
         FROM products p \
         JOIN prices pr ON pr.product_id = p.id \
         WHERE pr.store_id = $1 \
         ORDER BY p.id, p.updated_at DESC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every product in a category, newest first. No pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_category(
    pool: &PgPool,
    category: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, unit, created_by, created_at, updated_at \
         FROM products \
         WHERE category = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(category)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
