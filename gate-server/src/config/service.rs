use serde::Deserialize;

fn default_url() -> String {
    "http://su1.3scale.net".to_string()
}

fn default_query_timeout() -> u64 {
    5
}

/// Configuration for the remote authorization service
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Base URL of the authorization service (default: http://su1.3scale.net)
    #[serde(default = "default_url")]
    pub url: String,

    /// Provider key identifying this API provider; has no default and
    /// must be set for the gate to start
    #[serde(default)]
    pub provider_key: String,

    /// Timeout for authorize calls in seconds (default: 5)
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            provider_key: String::new(),
            query_timeout: default_query_timeout(),
        }
    }
}
