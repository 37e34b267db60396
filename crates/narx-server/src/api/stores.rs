use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct StoreItem {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StoreQuery {
    pub q: Option<String>,
}

pub(super) async fn search_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ApiResponse<Vec<StoreItem>>>, ApiError> {
    let rows = narx_db::search_stores(&state.pool, query.q.as_deref().unwrap_or(""))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows
            .into_iter()
            .map(|r| StoreItem {
                id: r.id,
                name: r.name,
                created_at: r.created_at,
            })
            .collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
