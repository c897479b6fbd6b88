mod recognition_pool;
mod transcription_service;

pub use recognition_pool::{PoolError, PoolOptions, RecognitionPool};
pub use transcription_service::{
    PipelineStage, TranscriptionError, TranscriptionOptions, TranscriptionOutcome,
    TranscriptionRequest, TranscriptionService,
};
