use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::AudioNormalizer;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub redis_connected: bool,
}

/// Liveness stays 200 even when the cache is down; the flag tells operators
/// the service is running degraded.
pub async fn health_handler<N>(State(state): State<AppState<N>>) -> impl IntoResponse
where
    N: AudioNormalizer + 'static,
{
    let redis_connected = state.result_cache.healthy().await;

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            redis_connected,
        }),
    )
}
