mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AudioSettings, CacheSettings, LimitSettings, LoggingSettings, PoolSettings, ProviderSettings,
    ServerSettings, Settings, TranscriptionSettings,
};
