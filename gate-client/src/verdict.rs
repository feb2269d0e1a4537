use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authorization service's decision for one credentials triple.
///
/// Only `authorized` is interpreted here; everything else the service
/// returns (plan name, usage reports, denial reason) is carried through
/// untouched for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub authorized: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Verdict {
    /// A plain positive verdict with no extra fields
    pub fn allow() -> Self {
        Self {
            authorized: true,
            extra: Map::new(),
        }
    }

    /// A negative verdict carrying a denial reason
    pub fn deny(reason: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("reason".to_string(), Value::String(reason.to_string()));
        Self {
            authorized: false,
            extra,
        }
    }

    /// Denial reason reported by the service, if any
    pub fn reason(&self) -> Option<&str> {
        self.extra.get("reason").and_then(Value::as_str)
    }
}
