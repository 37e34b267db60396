use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use narx_core::BASE_CURRENCY;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitPriceBody {
    pub product_id: Uuid,
    /// Store name as typed by the user; resolved case-insensitively to an
    /// existing store or created on first use.
    pub store_name: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmittedPrice {
    id: Uuid,
    product_id: Uuid,
    store_id: Uuid,
    store_name: String,
    price: i64,
    normalized_price: Option<i64>,
    created_at: DateTime<Utc>,
}

pub(super) async fn submit_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubmitPriceBody>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedPrice>>), ApiError> {
    if body.price <= Decimal::ZERO {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "price must be positive",
        ));
    }
    if body.quantity <= Decimal::ZERO {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "quantity must be positive",
        ));
    }
    if body.store_name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "store name must not be empty",
        ));
    }

    if narx_db::get_product(&state.pool, body.product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .is_none()
    {
        return Err(ApiError::new(req_id.0, "not_found", "product not found"));
    }

    let currency = body.currency.as_deref().unwrap_or(BASE_CURRENCY);
    let price = narx_core::to_base_currency(body.price, currency, state.usd_rate).map_err(|e| {
        ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
    })?;

    let store = narx_db::upsert_store_by_name(&state.pool, &body.store_name, body.created_by)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let normalized_price = narx_core::normalize(Decimal::from(price), body.quantity, &body.unit);
    let row = narx_db::insert_price(
        &state.pool,
        &narx_db::NewPrice {
            product_id: body.product_id,
            store_id: store.id,
            price,
            currency: BASE_CURRENCY,
            quantity: body.quantity,
            unit: &body.unit,
            normalized_price,
            created_by: body.created_by,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SubmittedPrice {
                id: row.id,
                product_id: row.product_id,
                store_id: row.store_id,
                store_name: store.name,
                price: row.price,
                normalized_price: row.normalized_price,
                created_at: row.created_at,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn delete_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    narx_db::delete_price(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;

    Ok(StatusCode::NO_CONTENT)
}
