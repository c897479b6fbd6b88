mod audio_normalizer;
mod recognition_client;
mod result_cache;

pub use audio_normalizer::{AudioNormalizer, NormalizeError};
pub use recognition_client::{RecognitionClient, RecognitionError};
pub use result_cache::{CacheError, ResultCache};
