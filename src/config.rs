//! Event registry configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Credential and token configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_ms == 0 {
            return Err(Error::Config("rate_limit.window_ms must be positive".to_string()));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "rate_limit.sweep_interval_secs must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(Error::Config("auth.token_ttl_secs must be positive".to_string()));
        }
        if self.auth.pbkdf2_iterations == 0 {
            return Err(Error::Config("auth.pbkdf2_iterations must be positive".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the collection files
    pub data_dir: PathBuf,

    /// Users collection file name
    pub users_file: String,

    /// Events collection file name
    pub events_file: String,
}

impl StorageConfig {
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs_next::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("event-registry"),
            users_file: "users.json".to_string(),
            events_file: "events.json".to_string(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in milliseconds
    pub window_ms: u64,

    /// Requests admitted per client per window
    pub max_requests: u32,

    /// How often expired client windows are discarded
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 100,
            sweep_interval_secs: 60,
        }
    }
}

/// Credential and token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing bearer tokens (overridden by
    /// `EVENT_REGISTRY_TOKEN_SECRET`)
    pub token_secret: String,

    /// Bearer token lifetime in seconds
    pub token_ttl_secs: u64,

    /// PBKDF2 iterations for password hashing
    pub pbkdf2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: 24 * 60 * 60,
            pbkdf2_iterations: 100_000,
        }
    }
}
