//! # Sync Configuration
//!
//! Configuration for Square sync passes.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SQUARE_ACCESS_TOKEN=EAAA...                                        │
//! │     SQUARE_ENVIRONMENT=sandbox                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/sync.toml (Linux)                             │
//! │     ~/Library/Application Support/com.swell.storefront/sync.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     production environment, batch_size 100, tie → remote              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [square]
//! access_token = "EAAA..."
//! environment = "production"   # production | sandbox
//! api_version = "2024-10-17"
//! location_id = "L8Z9..."      # optional; first ACTIVE location otherwise
//! request_timeout_secs = 30
//! allow_client_token = true
//!
//! [sync]
//! batch_size = 100
//! retrieve_batch_size = 100
//! tie_break = "remote"         # remote | local
//! ```
//!
//! The access token is deliberately optional here: a pass without one fails
//! with `MissingAccessToken` at the moment it needs to call Square, after the
//! caller's role has been checked.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use swell_core::TieBreak;

/// Square refuses batch-create calls with more changes than this.
pub const MAX_CHANGES_PER_BATCH: usize = 100;

/// Upper bound accepted for `retrieve_batch_size`.
pub const MAX_RETRIEVE_BATCH: usize = 1000;

// =============================================================================
// Square Environment
// =============================================================================

/// Which Square deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareEnvironment {
    #[default]
    Production,
    Sandbox,
}

impl SquareEnvironment {
    /// REST base for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            SquareEnvironment::Production => "https://connect.squareup.com/v2",
            SquareEnvironment::Sandbox => "https://connect.squareupsandbox.com/v2",
        }
    }
}

impl std::fmt::Display for SquareEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SquareEnvironment::Production => write!(f, "production"),
            SquareEnvironment::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl std::str::FromStr for SquareEnvironment {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(SquareEnvironment::Production),
            "sandbox" => Ok(SquareEnvironment::Sandbox),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown Square environment: '{}'. Valid options: production, sandbox",
                other
            ))),
        }
    }
}

// =============================================================================
// Square Settings
// =============================================================================

/// Connection settings for the Square REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareSettings {
    /// Server-held access token. Takes precedence over any client token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default)]
    pub environment: SquareEnvironment,

    /// Overrides the environment's base URL (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sent as the `Square-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Location for inventory pushes. First ACTIVE location when unset.
    #[serde(default)]
    pub location_id: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Whether a token supplied by the admin client may stand in when the
    /// server has none.
    #[serde(default = "default_true")]
    pub allow_client_token: bool,
}

fn default_api_version() -> String {
    "2024-10-17".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for SquareSettings {
    fn default() -> Self {
        SquareSettings {
            access_token: None,
            environment: SquareEnvironment::default(),
            base_url: None,
            api_version: default_api_version(),
            location_id: None,
            request_timeout_secs: default_request_timeout(),
            allow_client_token: default_true(),
        }
    }
}

impl SquareSettings {
    /// The REST base, honoring `base_url` when set.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Pass behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Inventory changes per batch-create call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Variation ids per inventory batch-retrieve call.
    #[serde(default = "default_batch_size")]
    pub retrieve_batch_size: usize,

    /// Winner when local and remote timestamps are equal.
    #[serde(default)]
    pub tie_break: TieBreak,
}

fn default_batch_size() -> usize {
    100
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            batch_size: default_batch_size(),
            retrieve_batch_size: default_batch_size(),
            tie_break: TieBreak::default(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub square: SquareSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = url::Url::parse(self.square.base_url())?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(SyncError::InvalidUrl(format!(
                "Square URL must be http(s), got: {}",
                self.square.base_url()
            )));
        }

        if self.square.api_version.trim().is_empty() {
            return Err(SyncError::InvalidConfig("api_version must not be empty".into()));
        }

        if self.square.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.sync.batch_size == 0 || self.sync.batch_size > MAX_CHANGES_PER_BATCH {
            return Err(SyncError::InvalidConfig(format!(
                "batch_size must be between 1 and {}",
                MAX_CHANGES_PER_BATCH
            )));
        }

        if self.sync.retrieve_batch_size == 0 || self.sync.retrieve_batch_size > MAX_RETRIEVE_BATCH {
            return Err(SyncError::InvalidConfig(format!(
                "retrieve_batch_size must be between 1 and {}",
                MAX_RETRIEVE_BATCH
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("SQUARE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            debug!("Using Square access token from environment");
            self.square.access_token = Some(token);
        }

        if let Some(env) = lookup("SQUARE_ENVIRONMENT") {
            match env.parse() {
                Ok(parsed) => self.square.environment = parsed,
                Err(_) => warn!(environment = %env, "Unknown Square environment in environment"),
            }
        }

        if let Some(url) = lookup("SQUARE_BASE_URL") {
            debug!(url = %url, "Overriding Square base URL from environment");
            self.square.base_url = Some(url);
        }

        if let Some(version) = lookup("SQUARE_API_VERSION") {
            self.square.api_version = version;
        }

        if let Some(location) = lookup("SQUARE_LOCATION_ID") {
            self.square.location_id = Some(location);
        }

        if let Some(size) = lookup("SWELL_SYNC_BATCH_SIZE") {
            if let Ok(n) = size.parse::<usize>() {
                self.sync.batch_size = n;
            }
        }

        if let Some(tie) = lookup("SWELL_SYNC_TIE_BREAK") {
            match tie.parse() {
                Ok(parsed) => self.sync.tie_break = parsed,
                Err(e) => warn!(error = %e, "Ignoring tie-break override"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "swell", "storefront")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn base_url(&self) -> &str {
        self.square.base_url()
    }

    pub fn has_server_token(&self) -> bool {
        self.square
            .access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}
