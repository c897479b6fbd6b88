mod audio;
mod cache_key;
mod language;
mod recognition;

pub use audio::{AudioBlob, AudioFormat, NormalizedAudio, PcmSpec};
pub use cache_key::CacheKey;
pub use language::LanguageTag;
pub use recognition::{
    RecognitionConfig, RecognitionResult, SpeakerDiarization, TranscriptAlternative,
    TranscriptSegment, WordTiming,
};
