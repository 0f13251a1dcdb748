// TTS services module
// Synthesis backends and the per-sentence synthesizer with fallback

use bytes::Bytes;
use thiserror::Error;

use crate::config::{SynthesisBackend, SynthesisConfig};
use crate::errors::AppResult;
use crate::services::audio::AudioFormat;

pub mod elevenlabs;
pub mod google;
pub mod synthesizer;

pub use elevenlabs::ElevenLabsBackend;
pub use google::GoogleTranslateBackend;
pub use synthesizer::SegmentSynthesizer;

/// Ошибки бэкенда синтеза
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Сервис синтеза недоступен: {0}")]
    BackendUnavailable(String),

    #[error("Квота сервиса синтеза исчерпана: {0}")]
    QuotaExceeded(String),

    #[error("Некорректный текст для синтеза: {0}")]
    InvalidInput(String),
}

/// Закодированный ответ бэкенда: одна или несколько частей, идущих подряд
#[derive(Debug, Clone)]
pub struct EncodedSpeech {
    pub parts: Vec<Bytes>,
    pub format: AudioFormat,
}

impl EncodedSpeech {
    pub fn single(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self { parts: vec![data.into()], format }
    }
}

/// Trait that all synthesis backends must implement
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize one sentence
    async fn synthesize(&self, text: &str, language: &str) -> Result<EncodedSpeech, SynthesisError>;
}

/// Основной бэкенд по конфигурации. `None`, если выбран только резервный
/// или для основного нет ключа.
pub fn get_primary_backend(config: &SynthesisConfig) -> AppResult<Option<Box<dyn SpeechBackend>>> {
    match config.backend {
        SynthesisBackend::Primary if config.has_api_key() => {
            Ok(Some(Box::new(ElevenLabsBackend::new(config)?)))
        }
        SynthesisBackend::Primary => {
            log::warn!(
                "Primary synthesis backend selected but no API key configured, using fallback only"
            );
            Ok(None)
        }
        SynthesisBackend::Fallback => Ok(None),
    }
}

/// Резервный бэкенд доступен всегда
pub fn get_fallback_backend(config: &SynthesisConfig) -> AppResult<Box<dyn SpeechBackend>> {
    Ok(Box::new(GoogleTranslateBackend::new(config)?))
}
