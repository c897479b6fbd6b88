use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::{AudioNormalizer, NormalizeError, RecognitionError};
use crate::application::services::{TranscriptionError, TranscriptionRequest};
use crate::domain::{LanguageTag, TranscriptSegment};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub results: Vec<TranscriptSegment>,
    pub language: LanguageTag,
    pub cached: bool,
    pub processing_time: f64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler<N>(
    State(state): State<AppState<N>>,
    mut multipart: Multipart,
) -> Response
where
    N: AudioNormalizer + 'static,
{
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return bad_request(format!("failed to read multipart body: {}", e));
            }
        };

        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            match field.bytes().await {
                Ok(bytes) => file = Some((filename, bytes.to_vec())),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read uploaded file");
                    return bad_request(format!("failed to read uploaded file: {}", e));
                }
            }
        } else {
            match field.text().await {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(e) => {
                    return bad_request(format!("failed to read field {}: {}", name, e));
                }
            }
        }
    }

    let Some((filename, bytes)) = file else {
        tracing::warn!("Transcribe request without a file part");
        return bad_request("no file provided".to_string());
    };

    tracing::debug!(filename = %filename, bytes = bytes.len(), "Processing audio upload");

    let punctuation = match bool_field(&fields, "punctuation", true) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let profanity_filter = match bool_field(&fields, "profanity_filter", false) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let word_time_offsets = match bool_field(&fields, "word_time_offsets", true) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let speaker_diarization = match bool_field(&fields, "speaker_diarization", false) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let speaker_count = match u32_field(&fields, "speaker_count", 2) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };

    let request = TranscriptionRequest {
        filename,
        bytes,
        language: fields.get("language").cloned(),
        punctuation,
        profanity_filter,
        word_time_offsets,
        model: fields
            .get("model")
            .cloned()
            .unwrap_or_else(|| state.settings.transcription.default_model.clone()),
        speaker_diarization,
        speaker_count,
    };

    match state.transcription_service.transcribe(request).await {
        Ok(outcome) => {
            tracing::info!(
                cached = outcome.cached,
                language = %outcome.language,
                elapsed_ms = outcome.processing_time.as_millis() as u64,
                "Transcription completed"
            );
            (
                StatusCode::OK,
                Json(TranscribeResponse {
                    success: true,
                    results: outcome.result.segments,
                    language: outcome.language,
                    cached: outcome.cached,
                    processing_time: outcome.processing_time.as_secs_f64(),
                }),
            )
                .into_response()
        }
        Err(error) => failure_response(error),
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

fn bool_field(
    fields: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, Response> {
    match fields.get(name) {
        None => Ok(default),
        Some(raw) => parse_bool(raw)
            .ok_or_else(|| bad_request(format!("invalid boolean for {}: {}", name, raw))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn u32_field(
    fields: &HashMap<String, String>,
    name: &str,
    default: u32,
) -> Result<u32, Response> {
    match fields.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| bad_request(format!("invalid integer for {}: {}", name, raw))),
    }
}

fn failure_response(error: TranscriptionError) -> Response {
    let status = match &error {
        TranscriptionError::Validation(_) => StatusCode::BAD_REQUEST,
        TranscriptionError::Normalization(NormalizeError::UnsupportedFormat(_)) => {
            StatusCode::BAD_REQUEST
        }
        TranscriptionError::Normalization(NormalizeError::ConversionFailed(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TranscriptionError::Recognition(RecognitionError::Authentication(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TranscriptionError::Recognition(RecognitionError::Timeout(_)) => {
            StatusCode::GATEWAY_TIMEOUT
        }
        TranscriptionError::Recognition(_) => StatusCode::BAD_GATEWAY,
        TranscriptionError::Saturated => StatusCode::SERVICE_UNAVAILABLE,
        TranscriptionError::WorkersStopped => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if matches!(
        &error,
        TranscriptionError::Recognition(RecognitionError::Authentication(_))
    ) {
        tracing::error!(error = %error, "Provider authentication failed");
    } else if status.is_server_error() {
        tracing::error!(error = %error, status = %status, "Transcription failed");
    } else {
        tracing::warn!(error = %error, status = %status, "Transcription rejected");
    }

    if status.is_client_error() {
        return (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
            }),
        )
            .into_response();
    }

    (
        status,
        Json(FailureResponse {
            success: false,
            error: error.to_string(),
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}
