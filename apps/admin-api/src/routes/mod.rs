//! HTTP handlers, one module per resource.

pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use swell_db::{Database, DbConfig};
    use swell_sync::{JwtVerifier, Role, SyncConfig, SyncService};
    use tower::ServiceExt;

    use crate::{router, AppState};

    pub const SECRET: &str = "test-secret";

    pub async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let verifier = JwtVerifier::new(SECRET);
        let sync = SyncService::new(db.clone(), SyncConfig::default(), verifier.clone());
        AppState::new(db, sync, verifier)
    }

    pub fn token(role: Role) -> String {
        JwtVerifier::new(SECRET).issue("user-1", role, 3600).unwrap()
    }

    /// Sends one request and returns the status and JSON body.
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        role: Option<Role>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token(role)));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn app() -> (Router, AppState) {
        let state = state().await;
        (router(state.clone()), state)
    }
}
