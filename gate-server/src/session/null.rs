use super::{SessionBackend, SessionError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Session store that keeps nothing.
///
/// Used when verdict caching is disabled but the store interface is still
/// required; every request then pays a fresh authorize call.
#[derive(Clone, Debug, Default)]
pub struct NullSessions;

impl NullSessions {
    pub fn new() -> Self {
        NullSessions
    }
}

#[async_trait]
impl SessionBackend for NullSessions {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        _session_id: &str,
        _attr: &str,
        _value: &T,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        _session_id: &str,
        _attr: &str,
    ) -> Result<Option<T>, SessionError> {
        Ok(None)
    }

    async fn remove(&self, _session_id: &str, _attr: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
