mod prices;
mod products;
mod stores;
mod users;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use narx_core::DisplayOptions;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub display: DisplayOptions,
    pub usd_rate: Decimal,
    pub recent_feed_size: usize,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: &narx_core::AppConfig) -> Self {
        Self {
            pool,
            display: DisplayOptions {
                currency_symbol: config.currency_symbol.clone(),
            },
            usd_rate: config.usd_rate,
            recent_feed_size: config.recent_feed_size,
        }
    }

    #[cfg(test)]
    fn for_tests(pool: PgPool) -> Self {
        Self {
            pool,
            display: DisplayOptions::default(),
            usd_rate: Decimal::from(12_800),
            recent_feed_size: 10,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

/// Translates storage errors into the API error taxonomy.
///
/// Duplicate names and empty writes are caller mistakes, everything else is
/// logged and surfaced as an opaque internal error.
pub(super) fn map_db_error(request_id: String, error: &narx_db::DbError) -> ApiError {
    match error {
        narx_db::DbError::DuplicateProductName(name) => ApiError::new(
            request_id,
            "validation_error",
            format!("a product named \"{name}\" already exists"),
        ),
        narx_db::DbError::PermissionDenied => ApiError::new(
            request_id,
            "forbidden",
            "you are not allowed to modify this record",
        ),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/products",
            get(products::search_products).post(products::create_product),
        )
        .route("/api/v1/products/recent", get(products::list_recent))
        .route(
            "/api/v1/products/by-store/{store_id}",
            get(products::list_by_store),
        )
        .route(
            "/api/v1/products/by-category/{category}",
            get(products::list_by_category),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/v1/prices", post(prices::submit_price))
        .route("/api/v1/prices/{id}", delete(prices::delete_price))
        .route("/api/v1/stores", get(stores::search_stores))
        .route(
            "/api/v1/users/{user_id}/favorites",
            get(users::list_favorites),
        )
        .route(
            "/api/v1/users/{user_id}/favorites/{product_id}/toggle",
            post(users::toggle_favorite),
        )
        .route(
            "/api/v1/users/{user_id}/shopping-list",
            get(users::list_shopping_items).post(users::add_shopping_item),
        )
        .route(
            "/api/v1/users/{user_id}/shopping-list/checked",
            delete(users::clear_checked_items),
        )
        .route(
            "/api/v1/users/{user_id}/shopping-list/{item_id}",
            axum::routing::patch(users::set_item_checked).delete(users::remove_shopping_item),
        )
        .route(
            "/api/v1/users/{user_id}/reputation",
            get(users::get_reputation),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match narx_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
