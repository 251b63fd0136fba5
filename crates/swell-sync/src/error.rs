//! # Sync Error Types
//!
//! Error types for Square sync passes. Only fatal conditions live here;
//! degraded conditions (missing images, failed count chunks, failed change
//! batches) are counted in the pass report instead.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Authorization  │  │     Upstream            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unauthenticated│  │  SquareApi { status }   │ │
//! │  │  MissingToken   │  │  Forbidden      │  │  ConnectionFailed       │ │
//! │  │  InvalidUrl     │  │                 │  │  Timeout                │ │
//! │  └─────────────────┘  └─────────────────┘  │  NoActiveLocation       │ │
//! │                                            └─────────────────────────┘ │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Database     │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  DatabaseError  │  │  Internal       │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every fatal pass failure.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Neither the server configuration nor the caller supplied a Square token.
    #[error("Square access token not configured")]
    MissingAccessToken,

    /// Invalid Square base URL.
    #[error("Invalid Square URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    /// Missing, malformed, or expired bearer token.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid identity without the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Square answered with a non-success status.
    #[error("Square catalog API error: {status}")]
    SquareApi { status: u16, body: String },

    /// Request never reached Square or the connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Square returned a body we could not decode.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Push needs a location and none is configured or active.
    #[error("No active Square location")]
    NoActiveLocation,

    // =========================================================================
    // Database Errors
    // =========================================================================
    /// Database query failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<swell_db::DbError> for SyncError {
    fn from(err: swell_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::DeserializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::SquareApi {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if running the same pass again may succeed.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - Square 429 and 5xx responses
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::SquareApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingAccessToken
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the caller's identity was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SyncError::Unauthenticated(_) | SyncError::Forbidden(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("reset".into()).is_retryable());
        assert!(SyncError::Timeout("30s".into()).is_retryable());
        assert!(SyncError::SquareApi { status: 503, body: String::new() }.is_retryable());
        assert!(SyncError::SquareApi { status: 429, body: String::new() }.is_retryable());

        assert!(!SyncError::SquareApi { status: 401, body: String::new() }.is_retryable());
        assert!(!SyncError::MissingAccessToken.is_retryable());
        assert!(!SyncError::Forbidden("staff".into()).is_retryable());
    }

    #[test]
    fn test_categories() {
        assert!(SyncError::MissingAccessToken.is_config_error());
        assert!(SyncError::Unauthenticated("no token".into()).is_auth_error());
        assert!(!SyncError::NoActiveLocation.is_config_error());
    }

    #[test]
    fn test_upstream_message() {
        let err = SyncError::SquareApi {
            status: 500,
            body: "{}".into(),
        };
        assert_eq!(err.to_string(), "Square catalog API error: 500");
    }
}
