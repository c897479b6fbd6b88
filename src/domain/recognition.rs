use serde::{Deserialize, Serialize};

use super::language::LanguageTag;

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    pub language: LanguageTag,
    pub punctuation: bool,
    pub profanity_filter: bool,
    pub word_time_offsets: bool,
    pub model: String,
    pub diarization: Option<SpeakerDiarization>,
}

impl RecognitionConfig {
    /// Stable textual rendering used for cache key derivation. Field order is
    /// fixed; changing it invalidates every existing cache entry.
    pub fn canonical_string(&self) -> String {
        let diarization = match &self.diarization {
            Some(d) => d.speaker_count.to_string(),
            None => "off".to_string(),
        };
        format!(
            "lang={};punct={};profanity={};offsets={};model={};speakers={}",
            self.language,
            self.punctuation,
            self.profanity_filter,
            self.word_time_offsets,
            self.model,
            diarization,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakerDiarization {
    pub speaker_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub segments: Vec<TranscriptSegment>,
}

impl RecognitionResult {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn best_transcript(&self) -> String {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if let Some(alternative) = segment.alternatives.first() {
                if !alternative.transcript.is_empty() {
                    parts.push(alternative.transcript.as_str());
                }
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub alternatives: Vec<TranscriptAlternative>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAlternative {
    pub transcript: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<WordTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<i32>,
}
