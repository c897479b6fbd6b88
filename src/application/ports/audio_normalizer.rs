use crate::domain::{AudioBlob, NormalizedAudio, PcmSpec};

/// Decodes arbitrary uploaded audio into canonical PCM WAV. Implementations
/// are CPU-bound and synchronous; callers run them on a blocking thread.
pub trait AudioNormalizer: Send + Sync {
    fn normalize(&self, blob: &AudioBlob, target: PcmSpec)
        -> Result<NormalizedAudio, NormalizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("audio conversion failed: {0}")]
    ConversionFailed(String),
}
