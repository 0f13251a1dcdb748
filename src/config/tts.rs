use serde::{Deserialize, Serialize};

// Голос и модель ElevenLabs по умолчанию
pub const DEFAULT_VOICE_ID: &str = "GLHtjkeLJ9Rxcv9JhLmh";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

// Доступные бэкенды синтеза
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisBackend {
    /// ElevenLabs: высокое качество, ограниченная квота
    Primary,
    /// Google Translate TTS: доступен всегда, качество ниже
    Fallback,
}

impl Default for SynthesisBackend {
    fn default() -> Self {
        SynthesisBackend::Primary
    }
}

impl SynthesisBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisBackend::Primary => "primary",
            SynthesisBackend::Fallback => "fallback",
        }
    }
}

// Конфигурация синтеза речи
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    // Выбранный бэкенд
    pub backend: SynthesisBackend,

    // ElevenLabs настройки
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,

    // Таймаут одного обращения к бэкенду
    pub request_timeout_secs: u64,

    // Сколько предложений синтезируется одновременно
    pub max_concurrent_segments: usize,

    // Максимальная длина фрагмента для резервного бэкенда
    pub fallback_chunk_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            backend: SynthesisBackend::default(),
            api_key: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            request_timeout_secs: 30,
            max_concurrent_segments: 4,
            fallback_chunk_chars: 100,
        }
    }
}

impl SynthesisConfig {
    /// Ключ задан и не пустой
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}
