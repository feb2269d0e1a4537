use serde::Deserialize;

/// Specifies which session store implementation to use
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStoreKind {
    #[default]
    InMemory,
    #[serde(other)]
    None,
}

fn default_cookie() -> String {
    "gate_session".to_string()
}

fn default_ttl() -> u64 {
    3600
}

fn default_capacity() -> usize {
    64
}

/// Configuration for the per-caller session store
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the caller's session id
    /// (default: gate_session)
    #[serde(default = "default_cookie")]
    pub cookie: String,

    /// Session TTL in seconds (default: 1 hour)
    #[serde(default = "default_ttl")]
    pub ttl: u64,

    /// Maximum store capacity in MiB (default: 64 MiB)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Store type: "in-memory" (default) or "none"
    #[serde(default)]
    pub store: SessionStoreKind,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: default_cookie(),
            ttl: default_ttl(),
            capacity: default_capacity(),
            store: SessionStoreKind::default(),
        }
    }
}
