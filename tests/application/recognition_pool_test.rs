use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use narvik::application::ports::{CacheError, RecognitionClient, RecognitionError, ResultCache};
use narvik::application::services::{PoolError, PoolOptions, RecognitionPool};
use narvik::domain::{
    CacheKey, LanguageTag, NormalizedAudio, PcmSpec, RecognitionConfig, RecognitionResult,
    TranscriptAlternative, TranscriptSegment,
};

fn pool_options() -> PoolOptions {
    PoolOptions {
        workers: 2,
        queue_depth: 4,
        attempt_timeout: Duration::from_secs(5),
        max_attempts: 2,
        cache_ttl: Duration::from_secs(60),
    }
}

fn sample_audio() -> NormalizedAudio {
    NormalizedAudio::new(vec![0u8; 128], PcmSpec::new(16_000, 1))
}

fn sample_config() -> RecognitionConfig {
    RecognitionConfig {
        language: LanguageTag::parse("ru-RU").unwrap(),
        punctuation: true,
        profanity_filter: false,
        word_time_offsets: false,
        model: "default".to_string(),
        diarization: None,
    }
}

fn sample_result(text: &str) -> RecognitionResult {
    RecognitionResult {
        segments: vec![TranscriptSegment {
            alternatives: vec![TranscriptAlternative {
                transcript: text.to_string(),
                confidence: 0.9,
                words: vec![],
            }],
            channel: None,
            end_offset_seconds: None,
        }],
    }
}

fn sample_key() -> CacheKey {
    CacheKey::for_recognition(&sample_audio(), &sample_config())
}

struct CountingCache {
    puts: AtomicUsize,
    put_signal: Notify,
}

impl CountingCache {
    fn new() -> Self {
        Self {
            puts: AtomicUsize::new(0),
            put_signal: Notify::new(),
        }
    }
}

#[async_trait::async_trait]
impl ResultCache for CountingCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<RecognitionResult>, CacheError> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &CacheKey,
        _value: &RecognitionResult,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.put_signal.notify_one();
        Ok(())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

/// Fails the first `failures` calls with a transport error, then succeeds.
struct FlakyClient {
    calls: AtomicUsize,
    failures: usize,
}

impl FlakyClient {
    fn new(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
        }
    }
}

#[async_trait::async_trait]
impl RecognitionClient for FlakyClient {
    async fn recognize(
        &self,
        _audio: &NormalizedAudio,
        _config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(RecognitionError::Network("connection reset".to_string()))
        } else {
            Ok(sample_result("recovered"))
        }
    }
}

struct RejectingClient {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl RecognitionClient for RejectingClient {
    async fn recognize(
        &self,
        _audio: &NormalizedAudio,
        _config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RecognitionError::Provider {
            status: 429,
            body: "quota exceeded".to_string(),
        })
    }
}

struct SlowClient;

#[async_trait::async_trait]
impl RecognitionClient for SlowClient {
    async fn recognize(
        &self,
        _audio: &NormalizedAudio,
        _config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(sample_result("too late"))
    }
}

/// Signals when a call starts and blocks until the test releases it.
struct BlockingClient {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl RecognitionClient for BlockingClient {
    async fn recognize(
        &self,
        _audio: &NormalizedAudio,
        _config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(sample_result("unblocked"))
    }
}

#[tokio::test]
async fn given_healthy_client_when_submitting_job_then_returns_result_and_fills_cache() {
    let client = Arc::new(FlakyClient::new(0));
    let cache = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(pool_options(), client, Arc::clone(&cache) as Arc<dyn ResultCache>);

    let result = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await
        .unwrap();

    assert_eq!(result.best_transcript(), "recovered");
    assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_one_transient_failure_when_submitting_then_retries_and_succeeds() {
    let client = Arc::new(FlakyClient::new(1));
    let cache: Arc<dyn ResultCache> = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(
        pool_options(),
        Arc::clone(&client) as Arc<dyn RecognitionClient>,
        cache,
    );

    let result = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await;

    assert!(result.is_ok());
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_persistent_transient_failures_when_attempts_exhausted_then_returns_error() {
    let client = Arc::new(FlakyClient::new(10));
    let cache = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(
        pool_options(),
        Arc::clone(&client) as Arc<dyn RecognitionClient>,
        Arc::clone(&cache) as Arc<dyn ResultCache>,
    );

    let result = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await;

    assert!(matches!(
        result,
        Err(PoolError::Recognition(RecognitionError::Network(_)))
    ));
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_provider_rejection_when_submitting_then_does_not_retry() {
    let client = Arc::new(RejectingClient {
        calls: AtomicUsize::new(0),
    });
    let cache: Arc<dyn ResultCache> = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(
        pool_options(),
        Arc::clone(&client) as Arc<dyn RecognitionClient>,
        cache,
    );

    let result = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await;

    match result {
        Err(PoolError::Recognition(RecognitionError::Provider { status, body })) => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected provider rejection, got {:?}", other),
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_slow_client_when_attempt_deadline_passes_then_returns_timeout() {
    let options = PoolOptions {
        workers: 1,
        queue_depth: 1,
        attempt_timeout: Duration::from_millis(50),
        max_attempts: 1,
        cache_ttl: Duration::from_secs(60),
    };
    let cache: Arc<dyn ResultCache> = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(options, Arc::new(SlowClient), cache);

    let result = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await;

    assert!(matches!(
        result,
        Err(PoolError::Recognition(RecognitionError::Timeout(_)))
    ));
}

#[tokio::test]
async fn given_busy_worker_and_full_queue_when_submitting_then_returns_saturated() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let client = Arc::new(BlockingClient {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    });
    let cache: Arc<dyn ResultCache> = Arc::new(CountingCache::new());
    let options = PoolOptions {
        workers: 1,
        queue_depth: 1,
        attempt_timeout: Duration::from_secs(5),
        max_attempts: 1,
        cache_ttl: Duration::from_secs(60),
    };
    let pool = RecognitionPool::spawn(options, client, cache);

    let first = tokio::spawn({
        let pool = pool.clone();
        async move {
            pool.recognize(sample_audio(), sample_config(), sample_key())
                .await
        }
    });
    entered.notified().await;

    let second = tokio::spawn({
        let pool = pool.clone();
        async move {
            pool.recognize(sample_audio(), sample_config(), sample_key())
                .await
        }
    });
    // Give the queued submission time to land before overflowing it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let third = pool
        .recognize(sample_audio(), sample_config(), sample_key())
        .await;
    assert!(matches!(third, Err(PoolError::Saturated)));

    release.notify_one();
    entered.notified().await;
    release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
}

#[tokio::test]
async fn given_requester_gone_when_job_completes_then_cache_is_still_filled() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let client = Arc::new(BlockingClient {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    });
    let cache = Arc::new(CountingCache::new());
    let pool = RecognitionPool::spawn(
        pool_options(),
        client,
        Arc::clone(&cache) as Arc<dyn ResultCache>,
    );

    let request = tokio::spawn({
        let pool = pool.clone();
        async move {
            pool.recognize(sample_audio(), sample_config(), sample_key())
                .await
        }
    });
    entered.notified().await;
    request.abort();
    release.notify_one();

    cache.put_signal.notified().await;
    assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
}
