//! Role checks for handlers.

use axum::http::{header, HeaderMap};
use swell_sync::{authorize, extract_bearer_token, Claims, Role};

use crate::error::ApiResult;
use crate::AppState;

/// Roles allowed to administer products and trigger syncs.
pub const ADMIN: &[Role] = &[Role::Admin];

/// Roles allowed to work orders and ring up POS sales.
pub const STAFF: &[Role] = &[Role::Admin, Role::Staff];

/// The bearer token from the `Authorization` header, if any.
pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
}

/// Verifies the caller and checks their role.
pub fn require(state: &AppState, headers: &HeaderMap, allowed: &[Role]) -> ApiResult<Claims> {
    Ok(authorize(&state.verifier, bearer(headers), allowed)?)
}
