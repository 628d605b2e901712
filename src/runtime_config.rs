//! Environment overrides for [`AppConfig`].
//!
//! | variable                       | overrides                   |
//! |--------------------------------|-----------------------------|
//! | `NUBES_RATE_LIMIT_MAX`         | `rate_limit.max_requests`   |
//! | `NUBES_RATE_LIMIT_WINDOW_SECS` | `rate_limit.window_secs`    |
//! | `NUBES_RATE_LIMIT_MAX_CLIENTS` | `rate_limit.max_clients`    |
//! | `NUBES_MAX_PER_PAGE`           | `pagination.max_per_page`   |
//!
//! Unparseable values are ignored with a warning.
//!
//! ```rust
//! use nubes::config::AppConfig;
//! use nubes::runtime_config::RuntimeConfig;
//!
//! let mut config = AppConfig::default();
//! RuntimeConfig::from_env().apply(&mut config);
//! ```

use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub rate_limit_max: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    pub rate_limit_max_clients: Option<usize>,
    pub max_per_page: Option<u32>,
}

fn var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            rate_limit_max: var("NUBES_RATE_LIMIT_MAX"),
            rate_limit_window_secs: var("NUBES_RATE_LIMIT_WINDOW_SECS"),
            rate_limit_max_clients: var("NUBES_RATE_LIMIT_MAX_CLIENTS"),
            max_per_page: var("NUBES_MAX_PER_PAGE"),
        }
    }

    /// Overwrite every value that is set.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(v) = self.rate_limit_max {
            config.rate_limit.max_requests = v;
        }
        if let Some(v) = self.rate_limit_window_secs {
            config.rate_limit.window_secs = v;
        }
        if let Some(v) = self.rate_limit_max_clients {
            config.rate_limit.max_clients = v;
        }
        if let Some(v) = self.max_per_page {
            config.pagination.max_per_page = v;
        }
    }
}
