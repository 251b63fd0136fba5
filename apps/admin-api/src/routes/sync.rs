//! # Sync Trigger
//!
//! `POST /api/sync` runs one pull or push pass against Square. The caller
//! must hold the admin role; the role check happens before the Square token
//! is even looked up.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use swell_core::{SyncDirection, SyncRun};
use swell_sync::{SyncReport, SyncRequest};

use crate::auth::{self, ADMIN};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncBody {
    pub direction: SyncDirection,
    /// Square token held by the admin client; used only when the server has none.
    pub square_token: Option<String>,
}

/// `POST /api/sync`
pub async fn trigger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SyncBody>,
) -> ApiResult<Json<SyncReport>> {
    let report = state
        .sync
        .run(SyncRequest {
            direction: body.direction,
            bearer: auth::bearer(&headers),
            client_token: body.square_token.as_deref(),
        })
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<u32>,
}

/// `GET /api/sync/runs`
pub async fn runs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RunsQuery>,
) -> ApiResult<Json<Vec<SyncRun>>> {
    auth::require(&state, &headers, ADMIN)?;
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    Ok(Json(state.sync.history(limit).await?))
}
