pub use crate::config::filter::FilterConfig;
pub use crate::config::service::ServiceConfig;
pub use crate::config::session::{SessionConfig, SessionStoreKind};
use config::{Config as ConfigCrate, ConfigError};
use serde::Deserialize;

pub mod filter;
pub mod service;
pub mod session;

fn default_port() -> u16 {
    7788
}

/// Main configuration structure for the gate server
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// The port the gate server will listen to (default: 7788)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Authorization service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Request filtering configuration
    #[serde(default)]
    pub filter: FilterConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            service: ServiceConfig::default(),
            filter: FilterConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl GateConfig {
    /// Creates a new Config instance from environment variables.
    ///
    /// Nested sections use a double underscore, e.g.
    /// `GATE_SERVICE__PROVIDER_KEY` or `GATE_FILTER__REDIRECT_URL`.
    pub fn new() -> Result<Self, String> {
        let config: Self = ConfigCrate::builder()
            .add_source(
                config::Environment::with_prefix("GATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// The gate must never start without a provider key
    pub fn validate(&self) -> Result<(), String> {
        if self.service.provider_key.is_empty() {
            return Err("missing provider key".to_string());
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn for_test_with_mock(service_mock: &wiremock::MockServer) -> Self {
        let mut config = Self::default();
        config.service.url = service_mock.uri();
        config.service.provider_key = "test_provider_key".to_string();
        config.service.query_timeout = 5;
        config.session.ttl = 60;
        config
    }
}
