use super::{SessionBackend, SessionError};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct InMemorySessions {
    cache: MokaCache<String, String>,
}

impl InMemorySessions {
    /// Initialize a new in-memory session store.
    ///
    /// `capacity_mib` bounds the total size of serialized attributes;
    /// expired or evicted entries simply force a fresh authorize call.
    pub fn new(ttl_secs: u64, capacity_mib: usize) -> Result<Self, String> {
        let max_capacity_bytes: u64 = (capacity_mib * 1024 * 1024)
            .try_into()
            .map_err(|_| "capacity overflow".to_string())?;

        let cache = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .weigher(|_key, value: &String| value.len().try_into().unwrap_or(u32::MAX))
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self { cache })
    }

    fn key(session_id: &str, attr: &str) -> String {
        format!("{session_id}:{attr}")
    }
}

#[async_trait]
impl SessionBackend for InMemorySessions {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
        value: &T,
    ) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(value)?;
        self.cache.insert(Self::key(session_id, attr), serialized).await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        session_id: &str,
        attr: &str,
    ) -> Result<Option<T>, SessionError> {
        if let Some(value) = self.cache.get(&Self::key(session_id, attr)).await {
            serde_json::from_str(&value)
                .map_err(|e| SessionError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn remove(&self, session_id: &str, attr: &str) -> Result<(), SessionError> {
        self.cache.remove(&Self::key(session_id, attr)).await;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
