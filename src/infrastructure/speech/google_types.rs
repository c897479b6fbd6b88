use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::domain::{
    NormalizedAudio, RecognitionConfig, RecognitionResult, TranscriptAlternative,
    TranscriptSegment, WordTiming,
};

const LINEAR16: &str = "LINEAR16";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeRequest {
    pub config: RecognitionConfigPayload,
    pub audio: RecognitionAudio,
}

impl RecognizeRequest {
    pub fn new(audio: &NormalizedAudio, config: &RecognitionConfig) -> Self {
        let spec = audio.spec();
        let diarization_config = config.diarization.map(|d| DiarizationConfigPayload {
            enable_speaker_diarization: true,
            min_speaker_count: d.speaker_count,
            max_speaker_count: d.speaker_count,
        });

        Self {
            config: RecognitionConfigPayload {
                encoding: LINEAR16,
                sample_rate_hertz: spec.sample_rate_hz,
                audio_channel_count: (spec.channels > 1).then_some(spec.channels as u32),
                language_code: config.language.as_str().to_string(),
                enable_automatic_punctuation: config.punctuation,
                profanity_filter: config.profanity_filter,
                enable_word_time_offsets: config.word_time_offsets,
                model: config.model.clone(),
                use_enhanced: true,
                diarization_config,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio.bytes()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfigPayload {
    pub encoding: &'static str,
    pub sample_rate_hertz: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channel_count: Option<u32>,
    pub language_code: String,
    pub enable_automatic_punctuation: bool,
    pub profanity_filter: bool,
    pub enable_word_time_offsets: bool,
    pub model: String,
    pub use_enhanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization_config: Option<DiarizationConfigPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiarizationConfigPayload {
    pub enable_speaker_diarization: bool,
    pub min_speaker_count: u32,
    pub max_speaker_count: u32,
}

#[derive(Debug, Serialize)]
pub struct RecognitionAudio {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

impl RecognizeResponse {
    pub fn into_domain(self) -> RecognitionResult {
        let segments = self
            .results
            .into_iter()
            .map(|result| TranscriptSegment {
                alternatives: result
                    .alternatives
                    .into_iter()
                    .map(convert_alternative)
                    .collect(),
                channel: result.channel_tag,
                end_offset_seconds: result
                    .result_end_time
                    .as_deref()
                    .and_then(parse_duration_seconds),
            })
            .collect();

        RecognitionResult { segments }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
    #[serde(default)]
    pub channel_tag: Option<i32>,
    #[serde(default)]
    pub result_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub words: Vec<WordInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub speaker_tag: Option<i32>,
}

fn convert_alternative(alternative: SpeechRecognitionAlternative) -> TranscriptAlternative {
    TranscriptAlternative {
        transcript: alternative.transcript,
        confidence: alternative.confidence,
        words: alternative.words.into_iter().map(convert_word).collect(),
    }
}

fn convert_word(word: WordInfo) -> WordTiming {
    WordTiming {
        start_seconds: word
            .start_time
            .as_deref()
            .and_then(parse_duration_seconds)
            .unwrap_or(0.0),
        end_seconds: word
            .end_time
            .as_deref()
            .and_then(parse_duration_seconds)
            .unwrap_or(0.0),
        word: word.word,
        speaker: word.speaker_tag,
    }
}

/// Durations arrive as decimal seconds with a trailing unit, e.g. "1.200s".
pub fn parse_duration_seconds(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('s').parse().ok()
}
