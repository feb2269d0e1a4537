use crate::config::GateConfig;
use crate::gate::responder::FailureResponder;
use crate::session::{create_session_store, SessionBackend, SessionStore};
use gate_client::{AuthorizerType, HttpAuthorizer};
use std::sync::Arc;

/// Shared application state: immutable after startup and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub authorizer: Arc<AuthorizerType>,
    pub sessions: Arc<SessionStore>,
    pub responder: Arc<FailureResponder>,
}

impl AppState {
    pub fn new(config: GateConfig) -> Result<Self, std::io::Error> {
        let authorizer = HttpAuthorizer::new(
            &config.service.url,
            &config.service.provider_key,
            config.service.query_timeout,
        )
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Failed to create authorize client: {e}"),
            )
        })?;

        let sessions = create_session_store(&config).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create session store: {e}"),
            )
        })?;

        Ok(Self::with_parts(
            config,
            AuthorizerType::Http(authorizer),
            sessions,
        ))
    }

    /// Assemble state from pre-built parts; the responder is derived from
    /// the configuration here so strategy selection happens exactly once.
    pub fn with_parts(
        config: GateConfig,
        authorizer: AuthorizerType,
        sessions: SessionStore,
    ) -> Self {
        let responder = FailureResponder::from_config(&config.filter);
        Self {
            config: Arc::new(config),
            authorizer: Arc::new(authorizer),
            sessions: Arc::new(sessions),
            responder: Arc::new(responder),
        }
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        self.sessions.health_check().await.is_ok()
    }
}
