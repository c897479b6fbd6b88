use std::fmt;

use sha2::{Digest, Sha256};

use super::audio::NormalizedAudio;
use super::recognition::RecognitionConfig;

const KEY_PREFIX: &str = "stt:v1:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derived purely from the normalized audio bytes and the recognition
    /// config, so identical requests land on the same key across restarts.
    pub fn for_recognition(audio: &NormalizedAudio, config: &RecognitionConfig) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(audio.bytes());
        hasher.update([0u8]);
        hasher.update(config.canonical_string().as_bytes());
        Self(format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
