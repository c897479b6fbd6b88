use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::application::ports::{RecognitionClient, RecognitionError};
use crate::domain::{NormalizedAudio, RecognitionConfig, RecognitionResult};

use super::credentials::Credentials;
use super::google_types::{RecognizeRequest, RecognizeResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GoogleSpeechClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    timeout_secs: u64,
}

impl GoogleSpeechClient {
    pub fn new(
        credentials: Credentials,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RecognitionError::Network(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn credential_strategy(&self) -> &'static str {
        self.credentials.strategy()
    }

    fn classify_transport(&self, error: reqwest::Error) -> RecognitionError {
        if error.is_timeout() {
            RecognitionError::Timeout(self.timeout_secs)
        } else {
            RecognitionError::Network(format!("request: {}", error))
        }
    }
}

#[async_trait]
impl RecognitionClient for GoogleSpeechClient {
    async fn recognize(
        &self,
        audio: &NormalizedAudio,
        config: &RecognitionConfig,
    ) -> Result<RecognitionResult, RecognitionError> {
        let payload = RecognizeRequest::new(audio, config);

        tracing::debug!(
            endpoint = %self.endpoint,
            language = %config.language,
            model = %config.model,
            "Sending audio to Google Speech-to-Text"
        );

        let request = self.credentials.apply(self.http.post(&self.endpoint)).await?;
        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RecognitionError::Authentication(format!(
                "status {}: {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RecognitionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: RecognizeResponse =
            response
                .json()
                .await
                .map_err(|e| RecognitionError::Provider {
                    status: status.as_u16(),
                    body: format!("unparseable response: {}", e),
                })?;

        let result = decoded.into_domain();
        tracing::info!(
            segments = result.segments.len(),
            "Google Speech-to-Text recognition completed"
        );
        Ok(result)
    }
}
