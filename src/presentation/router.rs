use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::AudioNormalizer;
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    health_handler, languages_handler, service_info_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<N>(state: AppState<N>) -> Router
where
    N: AudioNormalizer + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = state
        .settings
        .limits
        .max_upload_mb
        .saturating_mul(1024 * 1024);
    // Last-resort wall-clock ceiling for a whole request. Sized to the pool's
    // worst case (every attempt timing out) plus upload headroom, so a hung
    // provider surfaces as the pipeline's own timeout error, never as a
    // gateway trip that blames the client.
    let attempts = u64::from(state.settings.provider.max_attempts.max(1));
    let request_timeout = Duration::from_secs(
        state
            .settings
            .provider
            .timeout_secs
            .saturating_mul(attempts)
            .saturating_add(30),
    );

    Router::new()
        .route("/", get(service_info_handler::<N>))
        .route("/health", get(health_handler::<N>))
        .route("/languages", get(languages_handler))
        .route("/transcribe", post(transcribe_handler::<N>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            request_deadline(request_timeout, request, next)
        }))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

async fn request_deadline(limit: Duration, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(
                limit_secs = limit.as_secs(),
                "Request exceeded the gateway deadline"
            );
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(serde_json::json!({
                    "success": false,
                    "error": format!("request exceeded {} seconds", limit.as_secs()),
                    "timestamp": Utc::now(),
                })),
            )
                .into_response()
        }
    }
}
