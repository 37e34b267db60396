use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use narx_core::{AggregateView, DisplayModel, ProductCategory, ReportObservation};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductListItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

impl From<narx_db::ProductRow> for ProductListItem {
    fn from(row: narx_db::ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductSearchData {
    items: Vec<ProductListItem>,
    total: i64,
    has_more: bool,
}

/// One report from a product's history, newest first in responses.
#[derive(Debug, Serialize)]
pub(super) struct HistoryItem {
    id: Uuid,
    price: i64,
    currency: String,
    quantity: Decimal,
    unit: String,
    normalized_price: Option<i64>,
    store_name: String,
    created_at: DateTime<Utc>,
}

/// Full product view: stored fields, the derived aggregate, the UI-ready
/// display projection, and the raw history behind both.
#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub view: AggregateView,
    pub display: DisplayModel,
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecentReportItem {
    pub price_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: String,
    pub product_unit: String,
    pub price: i64,
    pub formatted_price: String,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductBody {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductBody {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteProductData {
    prices_removed: u64,
}

fn validate_category(request_id: &str, label: &str) -> Result<(), ApiError> {
    ProductCategory::from_str(label).map_err(|_| {
        ApiError::new(
            request_id.to_string(),
            "validation_error",
            format!("unknown category \"{label}\""),
        )
    })?;
    Ok(())
}

pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<ProductSearchData>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let page = narx_db::search_products(
        &state.pool,
        narx_db::ProductSearch {
            query: query.q.as_deref().unwrap_or(""),
            category: query.category.as_deref(),
            limit,
            offset,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let has_more = offset + (page.items.len() as i64) < page.total;
    Ok(Json(ApiResponse {
        data: ProductSearchData {
            items: page.items.into_iter().map(ProductListItem::from).collect(),
            total: page.total,
            has_more,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductBody>,
) -> Result<(StatusCode, Json<ApiResponse<ProductListItem>>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "product name must not be empty",
        ));
    }
    validate_category(&req_id.0, &body.category)?;

    let row = narx_db::insert_product(&state.pool, name, &body.category, &body.unit, body.created_by)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductListItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let Some(product) = narx_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    else {
        return Err(ApiError::new(req_id.0, "not_found", "product not found"));
    };

    let history = narx_db::list_prices_for_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let detail = build_detail(product, history, Utc::now(), &state);
    Ok(Json(ApiResponse {
        data: detail,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Aggregates a product's history (passed in insertion order) and projects
/// it through the display adapter. The current report's store comes back
/// through `view.current.index` into the same slice.
fn build_detail(
    product: narx_db::ProductRow,
    history: Vec<narx_db::PriceHistoryRow>,
    now: DateTime<Utc>,
    state: &AppState,
) -> ProductDetail {
    let observations: Vec<ReportObservation> = history
        .iter()
        .map(|r| ReportObservation {
            price: r.price,
            normalized_price: r.normalized_price,
            observed_at: r.created_at,
        })
        .collect();
    let view = narx_core::aggregate(&observations, now);

    let current_store = view
        .current
        .as_ref()
        .and_then(|c| history.get(c.index))
        .map(|r| r.store_name.as_str());
    let display = narx_core::present(
        &product.name,
        &product.unit,
        &view,
        current_store,
        now,
        &state.display,
    );

    let mut items: Vec<HistoryItem> = history
        .into_iter()
        .map(|r| HistoryItem {
            id: r.id,
            price: r.price,
            currency: r.currency,
            quantity: r.quantity,
            unit: r.unit,
            normalized_price: r.normalized_price,
            store_name: r.store_name,
            created_at: r.created_at,
        })
        .collect();
    items.reverse();

    ProductDetail {
        id: product.id,
        name: product.name,
        category: product.category,
        unit: product.unit,
        view,
        display,
        history: items,
    }
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductBody>,
) -> Result<Json<ApiResponse<ProductListItem>>, ApiError> {
    if let Some(category) = body.category.as_deref() {
        validate_category(&req_id.0, category)?;
    }
    if let Some(name) = body.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "product name must not be empty",
            ));
        }
    }

    let row = narx_db::update_product(
        &state.pool,
        id,
        body.name.as_deref().map(str::trim),
        body.category.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductListItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteProductData>>, ApiError> {
    let prices_removed = narx_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeleteProductData { prices_removed },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<RecentReportItem>>>, ApiError> {
    // Over-fetch so that deduplication by product still fills the feed.
    let fetch = i64::try_from(state.recent_feed_size * 2).unwrap_or(i64::MAX);
    let rows = narx_db::list_recent_prices(&state.pool, fetch)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let deduped = narx_core::dedupe_recent(rows, state.recent_feed_size, |r| r.product_id);
    let data = deduped
        .into_iter()
        .map(|r| RecentReportItem {
            price_id: r.price_id,
            product_id: r.product_id,
            product_name: r.product_name,
            product_category: r.product_category,
            product_unit: r.product_unit,
            price: r.price,
            formatted_price: narx_core::display::format_price(Some(r.price), &state.display),
            store_name: r.store_name,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_by_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ProductListItem>>>, ApiError> {
    let rows = narx_db::list_products_by_store(&state.pool, store_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductListItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProductListItem>>>, ApiError> {
    validate_category(&req_id.0, &category)?;

    let rows = narx_db::list_products_by_category(&state.pool, &category)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductListItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
