use async_trait::async_trait;

use crate::domain::{NormalizedAudio, RecognitionConfig, RecognitionResult};

#[async_trait]
pub trait RecognitionClient: Send + Sync {
    async fn recognize(
        &self,
        audio: &NormalizedAudio,
        config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("recognition timed out after {0} seconds")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
}

impl RecognitionError {
    /// Only timeouts and transport failures are worth retrying; provider
    /// rejections and credential problems are deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }
}
