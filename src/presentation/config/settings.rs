use config::Environment as EnvironmentSource;
use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::environment::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub audio: AudioSettings,
    pub limits: LimitSettings,
    pub pool: PoolSettings,
    pub transcription: TranscriptionSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layered configuration: optional appsettings.<env> file, then APP__
    /// environment variables (double underscore separates nesting levels).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str()))
                    .required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        configuration.try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub endpoint: String,
    /// Path to a service account JSON file, or the JSON itself.
    pub google_credentials: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://speech.googleapis.com/v1/speech:recognize".to_string(),
            google_credentials: None,
            api_key: None,
            timeout_secs: 300,
            max_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
    pub operation_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: 3600,
            operation_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_upload_mb: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_upload_mb: 100,
            allowed_extensions: ["mp3", "wav", "flac", "m4a", "aac", "ogg", "opus"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub workers: usize,
    pub queue_depth: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub default_language: String,
    pub default_model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            default_language: "ru-RU".to_string(),
            default_model: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
