//! Database operations for per-user shopping lists: free-text items,
//! optionally linked to a catalog product.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `shopping_list_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShoppingListItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub text: String,
    pub is_checked: bool,
    pub created_at: DateTime<Utc>,
}

/// Returns a user's list in the order items were added.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items(pool: &PgPool, user_id: Uuid) -> Result<Vec<ShoppingListItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ShoppingListItemRow>(
        "SELECT id, user_id, product_id, text, is_checked, created_at \
         FROM shopping_list_items \
         WHERE user_id = $1 \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds an unchecked item, optionally linked to a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_item(
    pool: &PgPool,
    user_id: Uuid,
    text: &str,
    product_id: Option<Uuid>,
) -> Result<ShoppingListItemRow, DbError> {
    let row = sqlx::query_as::<_, ShoppingListItemRow>(
        "INSERT INTO shopping_list_items (user_id, product_id, text) \
         VALUES ($1, $2, $3) \
         RETURNING id, user_id, product_id, text, is_checked, created_at",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(text)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Sets an item's checked flag. Scoped to the owning user.
///
/// # Errors
///
/// Returns [`DbError::PermissionDenied`] when no row was updated (wrong
/// owner or missing item), or [`DbError::Sqlx`] if the statement fails.
pub async fn set_item_checked(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    is_checked: bool,
) -> Result<(), DbError> {
    let done = sqlx::query(
        "UPDATE shopping_list_items SET is_checked = $3 \
         WHERE id = $2 AND user_id = $1",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(is_checked)
    .execute(pool)
    .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::PermissionDenied);
    }
    Ok(())
}

/// Removes a single item. Scoped to the owning user.
///
/// # Errors
///
/// Returns [`DbError::PermissionDenied`] when no row was deleted, or
/// [`DbError::Sqlx`] if the statement fails.
pub async fn remove_item(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<(), DbError> {
    let done = sqlx::query("DELETE FROM shopping_list_items WHERE id = $2 AND user_id = $1")
        .bind(user_id)
        .bind(item_id)
        .execute(pool)
        .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::PermissionDenied);
    }
    Ok(())
}

/// Clears every checked item from a user's list; returns how many were
/// removed (zero is fine here — clearing an empty list is not an error).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn delete_checked(pool: &PgPool, user_id: Uuid) -> Result<u64, DbError> {
    let done =
        sqlx::query("DELETE FROM shopping_list_items WHERE user_id = $1 AND is_checked = TRUE")
            .bind(user_id)
            .execute(pool)
            .await?;

    Ok(done.rows_affected())
}
