use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::application::ports::{RecognitionClient, RecognitionError, ResultCache};
use crate::domain::{CacheKey, NormalizedAudio, RecognitionConfig, RecognitionResult};

use super::transcription_service::PipelineStage;

pub struct RecognitionJob {
    audio: NormalizedAudio,
    config: RecognitionConfig,
    cache_key: CacheKey,
    respond_to: oneshot::Sender<Result<RecognitionResult, RecognitionError>>,
}

#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    pub workers: usize,
    pub queue_depth: usize,
    pub attempt_timeout: Duration,
    pub max_attempts: u32,
    pub cache_ttl: Duration,
}

/// Bounded pool of recognition workers. Submissions beyond the queue depth
/// are rejected immediately instead of piling up behind the provider.
#[derive(Clone)]
pub struct RecognitionPool {
    sender: mpsc::Sender<RecognitionJob>,
}

impl RecognitionPool {
    pub fn spawn(
        options: PoolOptions,
        client: Arc<dyn RecognitionClient>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(options.queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..options.workers.max(1) {
            let worker = RecognitionWorker {
                worker_id,
                receiver: Arc::clone(&receiver),
                client: Arc::clone(&client),
                cache: Arc::clone(&cache),
                options,
            };
            tokio::spawn(worker.run());
        }

        Self { sender }
    }

    pub async fn recognize(
        &self,
        audio: NormalizedAudio,
        config: RecognitionConfig,
        cache_key: CacheKey,
    ) -> Result<RecognitionResult, PoolError> {
        let (respond_to, response) = oneshot::channel();
        let job = RecognitionJob {
            audio,
            config,
            cache_key,
            respond_to,
        };

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PoolError::Saturated,
            mpsc::error::TrySendError::Closed(_) => PoolError::WorkersStopped,
        })?;

        match response.await {
            Ok(outcome) => outcome.map_err(PoolError::Recognition),
            Err(_) => Err(PoolError::WorkersStopped),
        }
    }
}

struct RecognitionWorker {
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<RecognitionJob>>>,
    client: Arc<dyn RecognitionClient>,
    cache: Arc<dyn ResultCache>,
    options: PoolOptions,
}

impl RecognitionWorker {
    async fn run(self) {
        tracing::info!(worker_id = self.worker_id, "Recognition worker started");
        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };
            let Some(job) = job else { break };
            self.process_job(job).await;
        }
        tracing::info!(
            worker_id = self.worker_id,
            "Recognition worker stopped: queue closed"
        );
    }

    #[tracing::instrument(
        name = "recognition_job",
        skip(self, job),
        fields(
            worker_id = self.worker_id,
            cache_key = %job.cache_key,
            language = %job.config.language,
        )
    )]
    async fn process_job(&self, job: RecognitionJob) {
        let RecognitionJob {
            audio,
            config,
            cache_key,
            respond_to,
        } = job;

        tracing::debug!(stage = %PipelineStage::Recognizing, "Pipeline stage");
        let outcome = self.recognize_with_retry(&audio, &config).await;

        // The cache is filled even when the requester has gone away, so an
        // abandoned upload still pays for the next identical one.
        if let Ok(result) = &outcome {
            match self
                .cache
                .put(&cache_key, result, self.options.cache_ttl)
                .await
            {
                Ok(()) => tracing::debug!(stage = %PipelineStage::CacheFilled, "Pipeline stage"),
                Err(e) => tracing::warn!(error = %e, "Result cache write failed; skipping"),
            }
        }

        if respond_to.send(outcome).is_err() {
            tracing::debug!("Requester dropped before recognition finished");
        }
    }

    async fn recognize_with_retry(
        &self,
        audio: &NormalizedAudio,
        config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(
                self.options.attempt_timeout,
                self.client.recognize(audio, config),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RecognitionError::Timeout(
                    self.options.attempt_timeout.as_secs(),
                )),
            };

            match outcome {
                Ok(result) => {
                    tracing::info!(
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        segments = result.segments.len(),
                        "Recognition succeeded"
                    );
                    return Ok(result);
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    tracing::warn!(attempt, error = %error, "Transient recognition failure; retrying");
                    attempt += 1;
                }
                Err(error) => {
                    tracing::warn!(attempt, error = %error, "Recognition failed");
                    return Err(error);
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("recognition queue is full")]
    Saturated,
    #[error("recognition workers are not running")]
    WorkersStopped,
    #[error("recognition: {0}")]
    Recognition(RecognitionError),
}
