use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::products::ProductListItem;
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const PRODUCT_SCORE_WEIGHT: i64 = 10;
const REPORT_SCORE_WEIGHT: i64 = 5;

#[derive(Debug, Serialize)]
pub(super) struct ReputationData {
    pub user_id: Uuid,
    pub products_created: i64,
    pub prices_reported: i64,
    /// Weighted contribution score: products count more than reports.
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct FavoriteToggleData {
    product_id: Uuid,
    is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ShoppingListItem {
    id: Uuid,
    product_id: Option<Uuid>,
    text: String,
    is_checked: bool,
    created_at: DateTime<Utc>,
}

impl From<narx_db::ShoppingListItemRow> for ShoppingListItem {
    fn from(row: narx_db::ShoppingListItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            text: row.text,
            is_checked: row.is_checked,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AddItemBody {
    pub text: String,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SetCheckedBody {
    pub is_checked: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearCheckedData {
    removed: u64,
}

pub(super) async fn list_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ProductListItem>>>, ApiError> {
    let rows = narx_db::list_favorite_products(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductListItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<FavoriteToggleData>>, ApiError> {
    let is_favorite = narx_db::toggle_favorite(&state.pool, user_id, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FavoriteToggleData {
            product_id,
            is_favorite,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Builds the contribution profile from two independent counts, issued
/// concurrently since neither depends on the other.
pub(super) async fn get_reputation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReputationData>>, ApiError> {
    let (products_created, prices_reported) = tokio::join!(
        narx_db::count_products_by_user(&state.pool, user_id),
        narx_db::count_prices_by_user(&state.pool, user_id),
    );
    let products_created =
        products_created.map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let prices_reported = prices_reported.map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ReputationData {
            user_id,
            products_created,
            prices_reported,
            score: products_created * PRODUCT_SCORE_WEIGHT
                + prices_reported * REPORT_SCORE_WEIGHT,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_shopping_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ShoppingListItem>>>, ApiError> {
    let rows = narx_db::list_items(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ShoppingListItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn add_shopping_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AddItemBody>,
) -> Result<(StatusCode, Json<ApiResponse<ShoppingListItem>>), ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "item text must not be empty",
        ));
    }

    let row = narx_db::add_item(&state.pool, user_id, text, body.product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ShoppingListItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn set_item_checked(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetCheckedBody>,
) -> Result<Json<ApiResponse<SetCheckedBody>>, ApiError> {
    narx_db::set_item_checked(&state.pool, user_id, item_id, body.is_checked)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: body,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn remove_shopping_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    narx_db::remove_item(&state.pool, user_id, item_id)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn clear_checked_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ClearCheckedData>>, ApiError> {
    let removed = narx_db::delete_checked(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ClearCheckedData { removed },
        meta: ResponseMeta::new(req_id.0),
    }))
}
