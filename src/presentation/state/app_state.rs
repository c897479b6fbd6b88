use std::sync::Arc;

use crate::application::ports::{AudioNormalizer, ResultCache};
use crate::application::services::TranscriptionService;
use crate::presentation::config::Settings;

pub struct AppState<N>
where
    N: AudioNormalizer,
{
    pub transcription_service: Arc<TranscriptionService<N>>,
    pub result_cache: Arc<dyn ResultCache>,
    pub settings: Settings,
}

impl<N> Clone for AppState<N>
where
    N: AudioNormalizer,
{
    fn clone(&self) -> Self {
        Self {
            transcription_service: Arc::clone(&self.transcription_service),
            result_cache: Arc::clone(&self.result_cache),
            settings: self.settings.clone(),
        }
    }
}
