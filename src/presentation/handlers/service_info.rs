use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::AudioNormalizer;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ServiceInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub formats: Vec<String>,
    pub max_upload_mb: usize,
}

pub async fn service_info_handler<N>(State(state): State<AppState<N>>) -> impl IntoResponse
where
    N: AudioNormalizer + 'static,
{
    (
        StatusCode::OK,
        Json(ServiceInfoResponse {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            formats: state.settings.limits.allowed_extensions.clone(),
            max_upload_mb: state.settings.limits.max_upload_mb,
        }),
    )
}
