use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{CacheError, ResultCache};
use crate::domain::{CacheKey, RecognitionResult};

const MAX_TTL: Duration = Duration::from_secs(86_400 * 365);

/// Process-local fallback used when no redis URL is configured. Values are
/// kept as JSON strings so decoding behaves exactly like the redis adapter.
pub struct InMemoryResultCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

struct StoredEntry {
    payload: String,
    expires_at: Instant,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<RecognitionResult>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key.as_str()) {
                Some(entry) if entry.expires_at > now => {
                    return serde_json::from_str(&entry.payload)
                        .map(Some)
                        .map_err(|e| {
                            CacheError::Serialization(format!("cached value: {}", e))
                        });
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Re-check under the write lock: a put() may have refreshed the entry
        // between releasing the read lock and getting here.
        let mut entries = self.entries.write().await;
        if entries
            .get(key.as_str())
            .is_some_and(|e| e.expires_at <= now)
        {
            entries.remove(key.as_str());
        }
        Ok(None)
    }

    async fn put(
        &self,
        key: &CacheKey,
        value: &RecognitionResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)
            .map_err(|e| CacheError::Serialization(format!("encode: {}", e)))?;
        let expires_at = Instant::now() + ttl.min(MAX_TTL);

        let mut entries = self.entries.write().await;
        entries.insert(key.as_str().to_string(), StoredEntry { payload, expires_at });
        Ok(())
    }

    // The health endpoint reports backend connectivity through this flag;
    // the process-local fallback has no backend to be connected to.
    async fn healthy(&self) -> bool {
        false
    }
}
