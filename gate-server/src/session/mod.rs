use crate::config::{GateConfig, SessionStoreKind};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod null;

/// Errors that can occur during session store operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Contract every session store backend must fulfill.
///
/// A session is a bag of named attributes scoped to one caller. Values
/// are stored serialized so backends stay payload-agnostic.
/// Implementations must be thread-safe and cloneable.
#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    /// Store an attribute in the caller's session
    async fn set<T: Serialize + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
        value: &T,
    ) -> Result<(), SessionError>;

    /// Retrieve an attribute from the caller's session
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
    ) -> Result<Option<T>, SessionError>;

    /// Remove an attribute from the caller's session
    async fn remove(&self, session_id: &str, attr: &str) -> Result<(), SessionError>;

    /// Performs a health check on the session store backend
    async fn health_check(&self) -> Result<(), String>;
}

/// Session store wrapper that provides a uniform interface regardless of
/// backend. The concrete implementation is chosen once at startup from
/// the application configuration.
#[derive(Clone)]
pub enum SessionStore {
    /// In-memory store backed by Moka
    InMemory(memory::InMemorySessions),
    /// No-op store used when session caching is disabled
    Null(null::NullSessions),
}

#[async_trait::async_trait]
impl SessionBackend for SessionStore {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
        value: &T,
    ) -> Result<(), SessionError> {
        match self {
            Self::InMemory(store) => store.set(session_id, attr, value).await,
            Self::Null(store) => store.set(session_id, attr, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
    ) -> Result<Option<T>, SessionError> {
        match self {
            Self::InMemory(store) => store.get(session_id, attr).await,
            Self::Null(store) => store.get(session_id, attr).await,
        }
    }

    async fn remove(&self, session_id: &str, attr: &str) -> Result<(), SessionError> {
        match self {
            Self::InMemory(store) => store.remove(session_id, attr).await,
            Self::Null(store) => store.remove(session_id, attr).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Null(store) => store.health_check().await,
        }
    }
}

/// Factory creating the session store selected by the configuration
pub fn create_session_store(config: &GateConfig) -> Result<SessionStore, SessionError> {
    match config.session.store {
        SessionStoreKind::InMemory => {
            let store =
                memory::InMemorySessions::new(config.session.ttl, config.session.capacity)
                    .map_err(SessionError::Config)?;
            Ok(SessionStore::InMemory(store))
        }
        SessionStoreKind::None => Ok(SessionStore::Null(null::NullSessions::new())),
    }
}

/// Per-caller view of the session store, scoped to one request.
///
/// The gate inserts this into request extensions on successful
/// authorization so downstream handlers can read the cached verdict.
#[derive(Clone)]
pub struct Session {
    store: Arc<SessionStore>,
    id: String,
}

impl Session {
    pub fn new(store: Arc<SessionStore>, id: String) -> Self {
        Self { store, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn set<T: Serialize + Send + Sync>(
        &self,
        attr: &str,
        value: &T,
    ) -> Result<(), SessionError> {
        self.store.set(&self.id, attr, value).await
    }

    pub async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        attr: &str,
    ) -> Result<Option<T>, SessionError> {
        self.store.get(&self.id, attr).await
    }

    pub async fn remove(&self, attr: &str) -> Result<(), SessionError> {
        self.store.remove(&self.id, attr).await
    }
}
