use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use narvik::application::ports::ResultCache;
use narvik::application::services::{
    PoolOptions, RecognitionPool, TranscriptionOptions, TranscriptionService,
};
use narvik::domain::{LanguageTag, PcmSpec};
use narvik::infrastructure::audio::SymphoniaNormalizer;
use narvik::infrastructure::cache::{InMemoryResultCache, RedisResultCache};
use narvik::infrastructure::observability::{TracingConfig, init_tracing};
use narvik::infrastructure::speech::{Credentials, GoogleSpeechClient};
use narvik::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Settings::load(environment)?;

    init_tracing(TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.json,
        level: settings.logging.level.clone(),
    });

    let default_language = LanguageTag::parse(&settings.transcription.default_language)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "invalid transcription.default_language: {}",
                settings.transcription.default_language
            )
        })?;

    // Credentials are resolved before the listener binds; a misconfigured
    // provider should fail the deploy, not the first request.
    let google_credentials = settings
        .provider
        .google_credentials
        .clone()
        .or_else(|| std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok());
    let credentials = Credentials::resolve(
        google_credentials.as_deref(),
        settings.provider.api_key.as_deref(),
    )?;

    let recognition_client = Arc::new(GoogleSpeechClient::new(
        credentials,
        settings.provider.endpoint.clone(),
        Duration::from_secs(settings.provider.timeout_secs),
    )?);
    tracing::info!(
        strategy = recognition_client.credential_strategy(),
        endpoint = %settings.provider.endpoint,
        "Recognition client ready"
    );

    let redis_url = settings
        .cache
        .redis_url
        .clone()
        .or_else(|| std::env::var("REDIS_URL").ok());
    let operation_timeout = Duration::from_millis(settings.cache.operation_timeout_ms);
    let result_cache: Arc<dyn ResultCache> =
        match redis_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => Arc::new(RedisResultCache::connect(url, operation_timeout).await?),
            None => {
                tracing::info!("No redis URL configured; using in-memory result cache");
                Arc::new(InMemoryResultCache::new())
            }
        };

    let pool = RecognitionPool::spawn(
        PoolOptions {
            workers: settings.pool.workers,
            queue_depth: settings.pool.queue_depth,
            attempt_timeout: Duration::from_secs(settings.provider.timeout_secs),
            max_attempts: settings.provider.max_attempts,
            cache_ttl: Duration::from_secs(settings.cache.ttl_secs),
        },
        recognition_client,
        Arc::clone(&result_cache),
    );

    let transcription_service = Arc::new(TranscriptionService::new(
        Arc::new(SymphoniaNormalizer::new()),
        Arc::clone(&result_cache),
        pool,
        TranscriptionOptions {
            target: PcmSpec::new(settings.audio.sample_rate_hz, settings.audio.channels),
            default_language,
            allowed_extensions: settings
                .limits
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        },
    ));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;

    let state = AppState {
        transcription_service,
        result_cache,
        settings,
    };
    let router = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
