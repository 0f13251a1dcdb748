// Error handling module
// Contains the crate-level error type and conversions from library errors

use thiserror::Error;

// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Ошибка конфигурации: {0}")]
    ConfigurationError(String),

    #[error("Ошибка обработки аудио: {0}")]
    AudioProcessingError(String),

    #[error("Ошибка API: {0}")]
    ApiError(String),

    #[error("Ошибка ввода/вывода: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ошибка сериализации: {0}")]
    SerializationError(String),

    #[error("Ошибка разбора субтитров: {0}")]
    SubtitleParsingError(String),

    #[error("Входной файл не найден: {0}")]
    MissingInputFile(String),

    #[error("Не удалось прочитать медиафайл: {0}")]
    UnreadableMedia(String),

    #[error("Некорректные входные данные: {0}")]
    InvalidInput(String),

    #[error("В тексте не найдено ни одного предложения")]
    NoSentences,

    #[error("Нет сегментов для сборки дорожки")]
    NoSegments,

    #[error("Другая ошибка: {0}")]
    Other(String),
}

// Реализация трейтов From для различных типов ошибок
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ApiError(err.to_string())
    }
}

impl From<hound::Error> for AppError {
    fn from(err: hound::Error) -> Self {
        AppError::AudioProcessingError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<crate::services::audio::ProbeError> for AppError {
    fn from(err: crate::services::audio::ProbeError) -> Self {
        match err {
            crate::services::audio::ProbeError::UnreadableMedia(msg) => {
                AppError::UnreadableMedia(msg)
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Other(format!("Background task failed: {}", err))
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
