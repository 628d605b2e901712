//! Application configuration file.
//!
//! ```yaml
//! rate_limit:
//!   max_requests: 60
//!   window_secs: 60
//!   max_clients: 10000
//!   sweep_interval: 1024
//!   status: 429
//! pagination:
//!   default_per_page: 30
//!   max_per_page: 100
//! auth:
//!   realm: nubes
//! ```
//!
//! Every key is optional. Environment overrides are applied on top by
//! [`RuntimeConfig`](crate::runtime_config::RuntimeConfig).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::services::{PaginationConfig, RateLimitConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm advertised in `WWW-Authenticate: Basic` challenges
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "nubes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rate_limit: RateLimitConfig,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load and validate a config file; `.yaml`/`.yml` is YAML, anything
    /// else JSON.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
        .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        info!(config = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Reject values that would make a service unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rl = &self.rate_limit;
        if rl.max_requests == 0 {
            return Err(invalid("rate_limit.max_requests", "must be at least 1"));
        }
        if rl.window_secs == 0 {
            return Err(invalid("rate_limit.window_secs", "must be at least 1"));
        }
        if rl.max_clients == 0 {
            return Err(invalid("rate_limit.max_clients", "must be at least 1"));
        }
        if !(401..=499).contains(&rl.status) {
            return Err(invalid(
                "rate_limit.status",
                format!("{} is not a client-error status other than 400", rl.status),
            ));
        }
        let pg = &self.pagination;
        if pg.max_per_page == 0 {
            return Err(invalid("pagination.max_per_page", "must be at least 1"));
        }
        if pg.default_per_page == 0 || pg.default_per_page > pg.max_per_page {
            return Err(invalid(
                "pagination.default_per_page",
                format!("must be between 1 and max_per_page ({})", pg.max_per_page),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.into(),
    }
}
