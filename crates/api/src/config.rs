//! Server Configuration
//!
//! Layered from an optional TOML file and `PAGER__*` environment variables
//! (e.g. `PAGER__SERVER__BIND_ADDR`, `PAGER__ENGINE__ACK_TIMEOUT_SECS`).

use alerting::EngineConfig;
use escalation_policy::ResourcePolicy;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    /// Escalation levels per monitored resource
    pub policies: Vec<ResourcePolicy>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from `path` (missing file is fine) with environment overrides
    pub fn load(path: &str) -> Result<Self, ApiError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PAGER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
