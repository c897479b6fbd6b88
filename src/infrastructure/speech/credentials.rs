use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::ports::RecognitionError;

const TOKEN_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const TOKEN_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: u64 = 3600;
const EXPIRY_SKEW_SECS: u64 = 60;

/// How requests to the provider get authenticated. Resolved once at startup;
/// a service account outranks an API key when both are configured.
pub enum Credentials {
    ServiceAccount(ServiceAccountAuth),
    ApiKey(String),
}

impl Credentials {
    pub fn resolve(
        google_credentials: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Self, RecognitionError> {
        if let Some(credentials) = google_credentials.filter(|c| !c.trim().is_empty()) {
            let raw = if Path::new(credentials).exists() {
                std::fs::read_to_string(credentials).map_err(|e| {
                    RecognitionError::Authentication(format!(
                        "cannot read credentials file {}: {}",
                        credentials, e
                    ))
                })?
            } else {
                credentials.to_string()
            };

            let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
                RecognitionError::Authentication(format!("invalid credentials json: {}", e))
            })?;

            tracing::info!(
                strategy = "service_account",
                client_email = %key.client_email,
                "Provider credentials resolved"
            );
            return Ok(Self::ServiceAccount(ServiceAccountAuth::new(key)));
        }

        if let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) {
            tracing::info!(strategy = "api_key", "Provider credentials resolved");
            return Ok(Self::ApiKey(api_key.to_string()));
        }

        Err(RecognitionError::Authentication(
            "no credential strategy configured: set provider.google_credentials or provider.api_key"
                .to_string(),
        ))
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::ApiKey(_) => "api_key",
        }
    }

    pub async fn apply(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, RecognitionError> {
        match self {
            Self::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            Self::ServiceAccount(auth) => {
                let token = auth.access_token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: u64,
}

pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: u64,
    iat: u64,
}

impl ServiceAccountAuth {
    fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            token: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// Returns the cached access token while it has more than a minute of
    /// validity left, otherwise signs a fresh JWT and exchanges it.
    async fn access_token(&self) -> Result<String, RecognitionError> {
        let now = unix_now();
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at.saturating_sub(now) > EXPIRY_SKEW_SECS {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.exchange_jwt(now).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        tracing::debug!("Provider access token refreshed");
        Ok(access_token)
    }

    async fn exchange_jwt(&self, now: u64) -> Result<CachedToken, RecognitionError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: TOKEN_SCOPE,
            aud: &self.key.token_uri,
            exp: now + TOKEN_LIFETIME_SECS,
            iat: now,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| {
                RecognitionError::Authentication(format!("invalid service account key: {}", e))
            })?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| RecognitionError::Authentication(format!("jwt signing: {}", e)))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", TOKEN_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RecognitionError::Network(format!("token exchange: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RecognitionError::Authentication(format!(
                "token exchange returned status {}: {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            RecognitionError::Authentication(format!("token response parse: {}", e))
        })?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
