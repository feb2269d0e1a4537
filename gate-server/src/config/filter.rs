use serde::Deserialize;

fn default_id_param() -> String {
    "app_id".to_string()
}

fn default_key_param() -> String {
    "app_key".to_string()
}

fn default_referrer_param() -> String {
    "referrer".to_string()
}

fn default_session_attr() -> String {
    "authorize_response".to_string()
}

fn default_protected_prefix() -> String {
    "/api".to_string()
}

/// Configuration for the authorization gate itself.
///
/// The parameter names and the session attribute name can all be
/// overridden when the hosting API already uses different names.
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    /// Request parameter carrying the application id (default: app_id)
    #[serde(default = "default_id_param")]
    pub id_param: String,

    /// Request parameter carrying the application key (default: app_key)
    #[serde(default = "default_key_param")]
    pub key_param: String,

    /// Request parameter carrying the referrer (default: referrer)
    #[serde(default = "default_referrer_param")]
    pub referrer_param: String,

    /// Session attribute under which a successful verdict is cached
    /// (default: authorize_response)
    #[serde(default = "default_session_attr")]
    pub session_attr: String,

    /// Endpoint failures are forwarded to; when unset, failures are
    /// rendered inline in the response body
    #[serde(default)]
    pub redirect_url: Option<String>,

    /// Path prefix of the routes the gate protects (default: /api)
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            id_param: default_id_param(),
            key_param: default_key_param(),
            referrer_param: default_referrer_param(),
            session_attr: default_session_attr(),
            redirect_url: None,
            protected_prefix: default_protected_prefix(),
        }
    }
}
