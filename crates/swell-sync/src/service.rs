//! # Sync Service
//!
//! The entry point the admin API calls for `POST /api/sync`.
//!
//! ## Pass Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SyncRequest { direction, bearer, client_token }                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. authorize(bearer, [admin])       ── 401 / 403, nothing recorded    │
//! │  2. resolve_access_token             ── CONFIGURATION_ERROR            │
//! │  3. connect (build SquareClient)                                       │
//! │  4. SyncOrchestrator::run(direction)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sync_runs.record(report or error)   steps 2-4 always leave a row      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{authorize, resolve_access_token, JwtVerifier, PosToken, Role};
use crate::config::{SquareSettings, SyncConfig};
use crate::error::SyncResult;
use crate::orchestrator::{SyncOrchestrator, SyncReport};
use crate::protocol::PosCatalog;
use crate::square::SquareClient;
use swell_core::{SyncDirection, SyncRun};
use swell_db::Database;

/// One trigger.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest<'a> {
    pub direction: SyncDirection,
    /// Raw bearer token from the `Authorization` header.
    pub bearer: Option<&'a str>,
    /// Square token offered by the admin client, used only as a fallback.
    pub client_token: Option<&'a str>,
}

/// Runs authorized, recorded sync passes.
#[derive(Debug, Clone)]
pub struct SyncService {
    db: Database,
    config: SyncConfig,
    verifier: JwtVerifier,
}

impl SyncService {
    pub fn new(db: Database, config: SyncConfig, verifier: JwtVerifier) -> Self {
        SyncService {
            db,
            config,
            verifier,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs a pass against Square.
    pub async fn run(&self, request: SyncRequest<'_>) -> SyncResult<SyncReport> {
        self.run_with(request, |settings, token| SquareClient::new(settings, &token.token))
            .await
    }

    /// Runs a pass against whatever catalog `connect` builds.
    ///
    /// `connect` is only called once the caller is authorized and a token is
    /// available.
    pub async fn run_with<C, F>(&self, request: SyncRequest<'_>, connect: F) -> SyncResult<SyncReport>
    where
        C: PosCatalog,
        F: FnOnce(&SquareSettings, &PosToken) -> SyncResult<C>,
    {
        let claims = authorize(&self.verifier, request.bearer, &[Role::Admin])?;
        info!(sub = %claims.sub, direction = %request.direction, "Sync requested");

        let started_at = Utc::now();
        let result = self.execute(request, connect).await;
        self.record(request.direction, started_at, &result).await;

        if let Err(e) = &result {
            error!(direction = %request.direction, error = %e, "Sync pass failed");
        }
        result
    }

    async fn execute<C, F>(&self, request: SyncRequest<'_>, connect: F) -> SyncResult<SyncReport>
    where
        C: PosCatalog,
        F: FnOnce(&SquareSettings, &PosToken) -> SyncResult<C>,
    {
        let token = resolve_access_token(&self.config, request.client_token)?;
        let catalog = connect(&self.config.square, &token)?;

        SyncOrchestrator::new(self.db.products(), catalog, self.config.sync)
            .with_location(self.config.square.location_id.clone())
            .run(request.direction)
            .await
    }

    async fn record(
        &self,
        direction: SyncDirection,
        started_at: chrono::DateTime<Utc>,
        result: &SyncResult<SyncReport>,
    ) {
        let (summary, error) = match result {
            Ok(report) => (serde_json::to_string(report).ok(), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let run = SyncRun {
            id: Uuid::new_v4().to_string(),
            direction,
            started_at,
            finished_at: Utc::now(),
            succeeded: result.is_ok(),
            summary,
            error,
        };

        if let Err(e) = self.db.sync_runs().record(&run).await {
            warn!(run_id = %run.id, error = %e, "Failed to record sync run");
        }
    }

    /// Most recent passes first.
    pub async fn history(&self, limit: u32) -> SyncResult<Vec<SyncRun>> {
        Ok(self.db.sync_runs().list_recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::mock::MockCatalog;
    use std::cell::Cell;
    use swell_db::DbConfig;

    async fn service(server_token: Option<&str>) -> SyncService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = SyncConfig::default();
        config.square.access_token = server_token.map(str::to_string);
        SyncService::new(db, config, JwtVerifier::new("test-secret"))
    }

    fn token(svc: &SyncService, role: Role) -> String {
        svc.verifier.issue("user-1", role, 3600).unwrap()
    }

    fn request<'a>(bearer: Option<&'a str>) -> SyncRequest<'a> {
        SyncRequest {
            direction: SyncDirection::Pull,
            bearer,
            client_token: None,
        }
    }

    #[tokio::test]
    async fn test_missing_bearer_never_connects() {
        let svc = service(Some("server")).await;
        let connected = Cell::new(false);

        let err = svc
            .run_with(request(None), |_, _| {
                connected.set(true);
                Ok(MockCatalog::new())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Unauthenticated(_)));
        assert!(!connected.get());
        assert!(svc.history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_never_connects() {
        let svc = service(Some("server")).await;
        let staff = token(&svc, Role::Staff);
        let connected = Cell::new(false);

        let err = svc
            .run_with(request(Some(&staff)), |_, _| {
                connected.set(true);
                Ok(MockCatalog::new())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Forbidden(_)));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_missing_square_token_is_config_error_and_recorded() {
        let svc = service(None).await;
        let admin = token(&svc, Role::Admin);

        let err = svc
            .run_with(request(Some(&admin)), |_, _| Ok(MockCatalog::new()))
            .await
            .unwrap_err();

        assert!(err.is_config_error());
        let runs = svc.history(10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert!(!runs[0].succeeded);
        assert_eq!(runs[0].error.as_deref(), Some("Square access token not configured"));
    }

    #[tokio::test]
    async fn test_server_token_reaches_connect() {
        let svc = service(Some("server")).await;
        let admin = token(&svc, Role::Admin);
        let mut req = request(Some(&admin));
        req.client_token = Some("client");

        let report = svc
            .run_with(req, |_, token| {
                assert_eq!(token.token, "server");
                Ok(MockCatalog::new())
            })
            .await
            .unwrap();

        assert_eq!(report, SyncReport::Pull(Default::default()));
        let runs = svc.history(10).await.unwrap();
        assert!(runs[0].succeeded);
        assert!(runs[0].summary.as_deref().unwrap().contains("\"direction\":\"pull\""));
    }
}
