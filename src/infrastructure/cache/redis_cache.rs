use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::application::ports::{CacheError, ResultCache};
use crate::domain::{CacheKey, RecognitionResult};

pub struct RedisResultCache {
    connection: ConnectionManager,
    operation_timeout: Duration,
}

impl RedisResultCache {
    /// Connects eagerly so a bad URL is caught at startup. The manager
    /// reconnects on its own after transient drops.
    pub async fn connect(url: &str, operation_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("redis url: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unavailable(format!("redis connect: {}", e)))?;

        tracing::info!("Connected to redis result cache");
        Ok(Self {
            connection,
            operation_timeout,
        })
    }
}

#[async_trait]
impl ResultCache for RedisResultCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<RecognitionResult>, CacheError> {
        let mut connection = self.connection.clone();
        let fetch = async move { connection.get::<_, Option<String>>(key.as_str()).await };

        let payload = tokio::time::timeout(self.operation_timeout, fetch)
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!(
                    "redis get timed out after {}ms",
                    self.operation_timeout.as_millis()
                ))
            })?
            .map_err(|e| CacheError::Unavailable(format!("redis get: {}", e)))?;

        match payload {
            // Stored values are decoded strictly as JSON data, never as
            // anything executable.
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(format!("cached value: {}", e))),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: &RecognitionResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)
            .map_err(|e| CacheError::Serialization(format!("encode: {}", e)))?;
        let ttl_secs = ttl.as_secs().max(1);

        let mut connection = self.connection.clone();
        let store = async move {
            connection
                .set_ex::<_, _, ()>(key.as_str(), payload, ttl_secs)
                .await
        };

        tokio::time::timeout(self.operation_timeout, store)
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!(
                    "redis set timed out after {}ms",
                    self.operation_timeout.as_millis()
                ))
            })?
            .map_err(|e| CacheError::Unavailable(format!("redis set: {}", e)))?;

        Ok(())
    }

    async fn healthy(&self) -> bool {
        let mut connection = self.connection.clone();
        let ping = async move {
            redis::cmd("PING")
                .query_async::<String>(&mut connection)
                .await
        };
        matches!(
            tokio::time::timeout(self.operation_timeout, ping).await,
            Ok(Ok(_))
        )
    }
}
