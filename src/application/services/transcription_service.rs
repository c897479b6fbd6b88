use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{AudioNormalizer, NormalizeError, RecognitionError, ResultCache};
use crate::domain::{
    AudioBlob, AudioFormat, CacheKey, LanguageTag, NormalizedAudio, PcmSpec, RecognitionConfig,
    RecognitionResult, SpeakerDiarization,
};

use super::recognition_pool::{PoolError, RecognitionPool};

pub struct TranscriptionRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub language: Option<String>,
    pub punctuation: bool,
    pub profanity_filter: bool,
    pub word_time_offsets: bool,
    pub model: String,
    pub speaker_diarization: bool,
    pub speaker_count: u32,
}

#[derive(Debug)]
pub struct TranscriptionOutcome {
    pub result: RecognitionResult,
    pub language: LanguageTag,
    pub cached: bool,
    pub processing_time: Duration,
}

#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    pub target: PcmSpec,
    pub default_language: LanguageTag,
    pub allowed_extensions: Vec<String>,
}

pub struct TranscriptionService<N> {
    normalizer: Arc<N>,
    cache: Arc<dyn ResultCache>,
    pool: RecognitionPool,
    options: TranscriptionOptions,
}

impl<N> TranscriptionService<N>
where
    N: AudioNormalizer + 'static,
{
    pub fn new(
        normalizer: Arc<N>,
        cache: Arc<dyn ResultCache>,
        pool: RecognitionPool,
        options: TranscriptionOptions,
    ) -> Self {
        Self {
            normalizer,
            cache,
            pool,
            options,
        }
    }

    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        match self.run_pipeline(request).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                tracing::debug!(stage = %PipelineStage::Errored, error = %error, "Pipeline stage");
                Err(error)
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionOutcome, TranscriptionError> {
        let started = Instant::now();
        tracing::debug!(
            stage = %PipelineStage::Received,
            filename = %request.filename,
            size_bytes = request.bytes.len(),
            "Pipeline stage"
        );

        let (blob, config) = self.validate(request)?;
        tracing::debug!(
            stage = %PipelineStage::Validated,
            language = %config.language,
            model = %config.model,
            "Pipeline stage"
        );

        let audio = self.normalize(blob).await?;
        tracing::debug!(
            stage = %PipelineStage::Normalized,
            duration_seconds = audio.duration_seconds(),
            "Pipeline stage"
        );

        let key = CacheKey::for_recognition(&audio, &config);
        let hit = match self.cache.get(&key).await {
            Ok(hit) => hit,
            Err(error) => {
                tracing::warn!(error = %error, "Result cache read failed; treating as miss");
                None
            }
        };
        tracing::debug!(
            stage = %PipelineStage::CacheChecked,
            cache_key = %key,
            hit = hit.is_some(),
            "Pipeline stage"
        );

        if let Some(result) = hit {
            return Ok(TranscriptionOutcome {
                result,
                language: config.language,
                cached: true,
                processing_time: started.elapsed(),
            });
        }

        let language = config.language.clone();
        let result = self
            .pool
            .recognize(audio, config, key)
            .await
            .map_err(|e| match e {
                PoolError::Saturated => TranscriptionError::Saturated,
                PoolError::WorkersStopped => TranscriptionError::WorkersStopped,
                PoolError::Recognition(e) => TranscriptionError::Recognition(e),
            })?;

        Ok(TranscriptionOutcome {
            result,
            language,
            cached: false,
            processing_time: started.elapsed(),
        })
    }

    fn validate(
        &self,
        request: TranscriptionRequest,
    ) -> Result<(AudioBlob, RecognitionConfig), TranscriptionError> {
        if request.filename.trim().is_empty() {
            return Err(TranscriptionError::Validation(
                "no file selected".to_string(),
            ));
        }
        if request.bytes.is_empty() {
            return Err(TranscriptionError::Validation(
                "uploaded file is empty".to_string(),
            ));
        }

        let format = AudioFormat::from_filename(&request.filename);
        let allowed = format
            .map(|f| self.options.allowed_extensions.iter().any(|e| e == f.as_str()))
            .unwrap_or(false);
        if !allowed {
            return Err(TranscriptionError::Validation(format!(
                "unsupported file extension; allowed: {}",
                self.options.allowed_extensions.join(", ")
            )));
        }

        if request.model.trim().is_empty() {
            return Err(TranscriptionError::Validation(
                "model must not be empty".to_string(),
            ));
        }

        let language = match request.language.as_deref() {
            None | Some("") => self.options.default_language.clone(),
            Some(raw) => match LanguageTag::parse(raw) {
                Some(tag) => tag,
                None => {
                    tracing::warn!(
                        requested = raw,
                        fallback = %self.options.default_language,
                        "Malformed language tag; using default"
                    );
                    self.options.default_language.clone()
                }
            },
        };

        let diarization = if request.speaker_diarization {
            if request.speaker_count < 2 {
                return Err(TranscriptionError::Validation(
                    "speaker_count must be at least 2".to_string(),
                ));
            }
            Some(SpeakerDiarization {
                speaker_count: request.speaker_count,
            })
        } else {
            None
        };

        let config = RecognitionConfig {
            language,
            punctuation: request.punctuation,
            profanity_filter: request.profanity_filter,
            word_time_offsets: request.word_time_offsets,
            model: request.model,
            diarization,
        };

        Ok((AudioBlob::new(request.filename, request.bytes), config))
    }

    async fn normalize(&self, blob: AudioBlob) -> Result<NormalizedAudio, TranscriptionError> {
        let normalizer = Arc::clone(&self.normalizer);
        let target = self.options.target;
        let handle = tokio::task::spawn_blocking(move || normalizer.normalize(&blob, target));

        match handle.await {
            Ok(outcome) => outcome.map_err(TranscriptionError::Normalization),
            Err(join_error) => Err(TranscriptionError::Normalization(
                NormalizeError::ConversionFailed(format!("decoder task aborted: {join_error}")),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Validated,
    Normalized,
    CacheChecked,
    Recognizing,
    CacheFilled,
    Errored,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "RECEIVED",
            PipelineStage::Validated => "VALIDATED",
            PipelineStage::Normalized => "NORMALIZED",
            PipelineStage::CacheChecked => "CACHE_CHECKED",
            PipelineStage::Recognizing => "RECOGNIZING",
            PipelineStage::CacheFilled => "CACHE_FILLED",
            PipelineStage::Errored => "ERRORED",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("normalization: {0}")]
    Normalization(#[from] NormalizeError),
    #[error("recognition: {0}")]
    Recognition(#[from] RecognitionError),
    #[error("recognition queue is full")]
    Saturated,
    #[error("recognition workers are not running")]
    WorkersStopped,
}
