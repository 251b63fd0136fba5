//! # Capability Checks
//!
//! Identity arrives as a bearer JWT minted by the storefront's auth service.
//! This module only verifies it and reads the role it carries.
//!
//! ## Gate Order for a Sync Trigger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization header                                                   │
//! │       │                                                                 │
//! │       ├── missing / not Bearer / bad signature / expired               │
//! │       │        └──► Unauthenticated (401)                               │
//! │       ▼                                                                 │
//! │  role == admin ?                                                        │
//! │       ├── no ──► Forbidden (403)                                        │
//! │       ▼                                                                 │
//! │  Square token: server config  ──►  client token (if allowed)           │
//! │       ├── neither ──► MissingAccessToken (CONFIGURATION_ERROR)          │
//! │       ▼                                                                 │
//! │  first Square call                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Role carried by a back-office identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Staff => write!(f, "staff"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
}

/// Verifies (and, for tests and tooling, issues) HS256 tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        JwtVerifier {
            secret: secret.into(),
        }
    }

    /// Mints a token for `sub` with the given role.
    pub fn issue(&self, sub: &str, role: Role, lifetime_secs: i64) -> SyncResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SyncError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validates signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> SyncResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| SyncError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Checks a bearer token against the roles an operation accepts.
///
/// ## Returns
/// * `Err(Unauthenticated)` - no token, or it does not verify
/// * `Err(Forbidden)` - verified, but the role is not in `allowed`
pub fn authorize(
    verifier: &JwtVerifier,
    bearer: Option<&str>,
    allowed: &[Role],
) -> SyncResult<Claims> {
    let token = bearer.ok_or_else(|| SyncError::Unauthenticated("missing bearer token".into()))?;
    let claims = verifier.verify(token)?;

    if !allowed.contains(&claims.role) {
        debug!(sub = %claims.sub, role = %claims.role, "Role not permitted");
        return Err(SyncError::Forbidden(format!(
            "role '{}' may not perform this operation",
            claims.role
        )));
    }

    Ok(claims)
}

// =============================================================================
// Square Token Precedence
// =============================================================================

/// Where the Square token for a pass came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    ServerConfig,
    ClientFallback,
}

/// The token a pass will use.
#[derive(Clone)]
pub struct PosToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for PosToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosToken")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Picks the Square token: server configuration first, the client's token
/// only as a labelled fallback.
///
/// Call this strictly after [`authorize`].
pub fn resolve_access_token(config: &SyncConfig, client_token: Option<&str>) -> SyncResult<PosToken> {
    if let Some(token) = config
        .square
        .access_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return Ok(PosToken {
            token: token.to_string(),
            source: TokenSource::ServerConfig,
        });
    }

    match client_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) if config.square.allow_client_token => {
            warn!("No server Square token configured; using client-supplied token");
            Ok(PosToken {
                token: token.to_string(),
                source: TokenSource::ClientFallback,
            })
        }
        _ => Err(SyncError::MissingAccessToken),
    }
}
