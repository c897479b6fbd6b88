use narvik::domain::{
    LanguageTag, RecognitionConfig, RecognitionResult, SpeakerDiarization, TranscriptAlternative,
    TranscriptSegment, WordTiming,
};

fn config() -> RecognitionConfig {
    RecognitionConfig {
        language: LanguageTag::parse("ru-RU").unwrap(),
        punctuation: true,
        profanity_filter: false,
        word_time_offsets: true,
        model: "default".to_string(),
        diarization: None,
    }
}

fn segment(transcript: &str) -> TranscriptSegment {
    TranscriptSegment {
        alternatives: vec![TranscriptAlternative {
            transcript: transcript.to_string(),
            confidence: 0.9,
            words: vec![],
        }],
        channel: None,
        end_offset_seconds: None,
    }
}

#[test]
fn given_config_without_diarization_when_rendering_canonical_string_then_format_is_stable() {
    assert_eq!(
        config().canonical_string(),
        "lang=ru-RU;punct=true;profanity=false;offsets=true;model=default;speakers=off"
    );
}

#[test]
fn given_config_with_diarization_when_rendering_canonical_string_then_includes_speaker_count() {
    let mut config = config();
    config.diarization = Some(SpeakerDiarization { speaker_count: 3 });

    assert!(config.canonical_string().ends_with(";speakers=3"));
}

#[test]
fn given_multiple_segments_when_building_best_transcript_then_joins_top_alternatives() {
    let result = RecognitionResult {
        segments: vec![segment("привет"), segment("мир")],
    };

    assert_eq!(result.best_transcript(), "привет мир");
}

#[test]
fn given_empty_alternative_when_building_best_transcript_then_skips_it() {
    let result = RecognitionResult {
        segments: vec![segment("hello"), segment(""), segment("world")],
    };

    assert_eq!(result.best_transcript(), "hello world");
}

#[test]
fn given_no_segments_when_checking_then_result_is_empty() {
    let result = RecognitionResult { segments: vec![] };

    assert!(result.is_empty());
    assert_eq!(result.best_transcript(), "");
}

#[test]
fn given_result_with_word_timings_when_serialized_then_json_roundtrips() {
    let result = RecognitionResult {
        segments: vec![TranscriptSegment {
            alternatives: vec![TranscriptAlternative {
                transcript: "готово".to_string(),
                confidence: 0.87,
                words: vec![WordTiming {
                    word: "готово".to_string(),
                    start_seconds: 0.0,
                    end_seconds: 1.2,
                    speaker: Some(1),
                }],
            }],
            channel: Some(0),
            end_offset_seconds: Some(1.2),
        }],
    };

    let encoded = serde_json::to_string(&result).unwrap();
    let decoded: RecognitionResult = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded, result);
}

#[test]
fn given_alternative_without_words_when_serialized_then_words_key_is_omitted() {
    let result = RecognitionResult {
        segments: vec![segment("short")],
    };

    let encoded = serde_json::to_value(&result).unwrap();
    let alternative = &encoded["segments"][0]["alternatives"][0];

    assert!(alternative.get("words").is_none());
    assert!(encoded["segments"][0].get("channel").is_none());
}
