// Configuration module
// Centralized management of application configuration

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub mod tts; // Synthesis configuration

pub use tts::{SynthesisBackend, SynthesisConfig};

/// Полная конфигурация запуска. Передается явно во все сервисы,
/// глобального состояния нет.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub base_name: String,
    pub track_sample_rate: u32,
    pub synthesis: SynthesisConfig,
    pub recognition: RecognitionConfig,
    pub realign: RealignConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            base_name: "narration".to_string(),
            track_sample_rate: 44_100,
            synthesis: SynthesisConfig::default(),
            recognition: RecognitionConfig::default(),
            realign: RealignConfig::default(),
        }
    }
}

impl AppConfig {
    /// Загружает конфигурацию из JSON файла. Отсутствующие поля берутся по умолчанию.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::MissingInputFile(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw).map_err(|e| {
            let message = format!("Failed to parse config {}: {}", path.display(), e);
            AppError::ConfigurationError(message)
        })?;
        info!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Подставляет API ключи из окружения, если они не заданы в файле
    pub fn apply_env_overrides(&mut self) {
        if !self.synthesis.has_api_key() {
            if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
                debug!("Using ELEVENLABS_API_KEY from environment");
                self.synthesis.api_key = Some(key);
            }
        }
        if self.recognition.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                debug!("Using OPENAI_API_KEY from environment");
                self.recognition.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.track_sample_rate == 0 {
            return Err(AppError::ConfigurationError(
                "track_sample_rate must be positive".to_string(),
            ));
        }
        if self.synthesis.max_concurrent_segments == 0 {
            return Err(AppError::ConfigurationError(
                "max_concurrent_segments must be positive".to_string(),
            ));
        }
        if self.synthesis.fallback_chunk_chars == 0 {
            return Err(AppError::ConfigurationError(
                "fallback_chunk_chars must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.realign.similarity_threshold) {
            return Err(AppError::ConfigurationError(
                "similarity_threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

// Конфигурация распознавания речи (OpenAI Whisper)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "whisper-1".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Стратегия пересинхронизации субтитров
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RealignStrategy {
    /// Выбор по качеству доступного сигнала
    Auto,
    Offset,
    AdaptiveWarp,
    ForcedAlignment,
    Proportional,
    Energy,
}

impl Default for RealignStrategy {
    fn default() -> Self {
        RealignStrategy::Auto
    }
}

impl RealignStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealignStrategy::Auto => "auto",
            RealignStrategy::Offset => "offset",
            RealignStrategy::AdaptiveWarp => "adaptive_warp",
            RealignStrategy::ForcedAlignment => "forced_alignment",
            RealignStrategy::Proportional => "proportional",
            RealignStrategy::Energy => "energy",
        }
    }
}

impl std::str::FromStr for RealignStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(RealignStrategy::Auto),
            "offset" => Ok(RealignStrategy::Offset),
            "adaptive_warp" | "warp" => Ok(RealignStrategy::AdaptiveWarp),
            "forced_alignment" | "forced" => Ok(RealignStrategy::ForcedAlignment),
            "proportional" => Ok(RealignStrategy::Proportional),
            "energy" => Ok(RealignStrategy::Energy),
            other => Err(format!("Unknown realignment strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealignConfig {
    pub strategy: RealignStrategy,
    /// Расхождение конца последней реплики и длины аудио, при котором коррекция не нужна
    pub trigger_tolerance_secs: f64,
    /// Порог включения нелинейного масштабирования
    pub warp_threshold_secs: f64,
    /// Минимальное сходство окна слов для принудительного выравнивания
    pub similarity_threshold: f64,
    /// Прогонять результат через форматирование по стандартам
    pub apply_standards: bool,
}

impl Default for RealignConfig {
    fn default() -> Self {
        Self {
            strategy: RealignStrategy::default(),
            trigger_tolerance_secs: 2.0,
            warp_threshold_secs: 5.0,
            similarity_threshold: 0.6,
            apply_standards: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"base_name": "lesson", "synthesis": {{"backend": "fallback"}}}}"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.base_name, "lesson");
        assert_eq!(config.synthesis.backend, SynthesisBackend::Fallback);
        assert_eq!(config.synthesis.voice_id, tts::DEFAULT_VOICE_ID);
        assert_eq!(config.track_sample_rate, 44_100);
        assert_eq!(config.realign.strategy, RealignStrategy::Auto);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let result = AppConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(AppError::MissingInputFile(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.synthesis.max_concurrent_segments = 0;
        assert!(config.validate().is_err(), "Нулевая параллельность должна отклоняться");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("adaptive-warp".parse::<RealignStrategy>(), Ok(RealignStrategy::AdaptiveWarp));
        assert_eq!("Forced".parse::<RealignStrategy>(), Ok(RealignStrategy::ForcedAlignment));
        assert!("dtw".parse::<RealignStrategy>().is_err());
    }
}
