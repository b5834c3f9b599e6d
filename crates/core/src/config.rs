//! Client configuration loaded from defaults and `PADDOCK_*` environment variables

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PADDOCK";

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash
    pub api_base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Send cookies with requests unless a request opts out
    pub with_credentials: bool,

    /// User agent sent on every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 10_000,
            with_credentials: true,
            user_agent: concat!("paddock-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed or the
    /// result is invalid
    pub fn from_env() -> CoreResult<Self> {
        Self::load(None)
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`]
    pub fn from_vars(vars: HashMap<String, String>) -> CoreResult<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> CoreResult<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("timeout_ms", defaults.timeout_ms)?
            .set_default("with_credentials", defaults.with_credentials)?
            .set_default("user_agent", defaults.user_agent)?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.normalized()
    }

    /// Strip trailing slashes and reject unusable values
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an empty base URL or a zero timeout
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        if self.api_base_url.is_empty() {
            return Err(CoreError::invalid_config("api_base_url must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(CoreError::invalid_config("timeout_ms must be greater than 0"));
        }
        Ok(self)
    }

    /// Request timeout
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
