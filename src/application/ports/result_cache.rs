use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CacheKey, RecognitionResult};

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<RecognitionResult>, CacheError>;

    async fn put(
        &self,
        key: &CacheKey,
        value: &RecognitionResult,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Whether a cache backend is connected and answering. Feeds the health
    /// endpoint; pipeline code never gates on it.
    async fn healthy(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
}
