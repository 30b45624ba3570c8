//! Configuration for catalog clients
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional configuration file, and `CATALOG__*` environment variables
//! (`CATALOG__API__BASE_URL`, `CATALOG__AUTH__REFRESH_PATH`, ...).

use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CATALOG";

/// Main client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Authentication endpoints and credential storage keys
    pub auth: AuthConfig,

    /// Live notification subscription
    pub notifications: NotificationConfig,

    /// Regional synchronization
    pub regionals: RegionalConfig,

    /// Directory holding persisted credentials and logs
    pub state_dir: PathBuf,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    pub base_url: String,

    /// Request timeout in seconds (0 keeps the transport default)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the token refresh endpoint
    pub refresh_path: String,

    /// Path of the login endpoint
    pub login_path: String,

    /// Path of the registration endpoint
    pub register_path: String,

    /// Storage key of the access token
    pub token_key: String,

    /// Storage key of the refresh token
    pub refresh_token_key: String,

    /// Route the application shell navigates to when a login is required
    pub login_route: String,
}

/// Live notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// WebSocket endpoint speaking STOMP
    pub ws_url: String,

    /// Destination carrying album notifications
    pub topic: String,

    /// Delay before reconnecting after the connection drops
    pub reconnect_delay_ms: u64,

    /// Heart-beat interval negotiated with the broker (both directions)
    pub heartbeat_ms: u64,
}

/// Regional synchronization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalConfig {
    /// Third-party source fetched directly when the backend cannot reach it
    pub external_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            timeout_secs: 0,
            user_agent: format!("catalog-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_path: "/auth/refresh".to_string(),
            login_path: "/auth/login".to_string(),
            register_path: "/auth/register".to_string(),
            token_key: "token".to_string(),
            refresh_token_key: "refreshToken".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8080/ws/websocket".to_string(),
            topic: "/topic/albums".to_string(),
            reconnect_delay_ms: 5_000,
            heartbeat_ms: 4_000,
        }
    }
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            external_url: "https://integrador-argus-api.geia.vip/v1/regionais".to_string(),
        }
    }
}

/// Default state directory: `CATALOG_STATE_DIR`, else `<data dir>/catalog`
pub fn default_state_dir() -> PathBuf {
    std::env::var("CATALOG_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("catalog")
        })
}

impl CatalogConfig {
    /// Load configuration from file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize::<Self>()?.with_resolved_state_dir())
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize::<Self>()?.with_resolved_state_dir())
    }

    /// Path of the file-backed credential store
    pub fn credentials_path(&self) -> PathBuf {
        self.state_dir.join("credentials.json")
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
    }

    fn with_resolved_state_dir(mut self) -> Self {
        if self.state_dir.as_os_str().is_empty() {
            self.state_dir = default_state_dir();
        }
        self
    }
}
