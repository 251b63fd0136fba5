//! Order management for staff and admins.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::{self, STAFF};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use swell_core::{Order, OrderStatus};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// `GET /api/orders`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    auth::require(&state, &headers, STAFF)?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.db.orders().list(limit).await?))
}

/// `GET /api/orders/{id}`
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    auth::require(&state, &headers, STAFF)?;
    state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: OrderStatus,
}

/// `PUT /api/orders/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Order>> {
    let claims = auth::require(&state, &headers, STAFF)?;
    let order = state.db.orders().update_status(&id, input.status).await?;
    info!(order_id = %id, status = ?order.status, by = %claims.sub, "Order status changed");
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct TrackingInput {
    /// `null` or blank clears it.
    pub tracking_number: Option<String>,
}

/// `PUT /api/orders/{id}/tracking`
pub async fn set_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TrackingInput>,
) -> ApiResult<Json<Order>> {
    auth::require(&state, &headers, STAFF)?;
    let tracking = input
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    Ok(Json(state.db.orders().set_tracking(&id, tracking).await?))
}
