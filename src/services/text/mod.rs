//! Подготовка текста: очистка и разбиение на предложения.

pub mod normalize;
pub mod splitter;

pub use normalize::normalize_for_speech;
pub use splitter::split_sentences;

use crate::errors::{AppError, AppResult};
use crate::models::TextSegment;

/// Очищает текст и делит его на предложения. Пустой результат прерывает запуск для языка.
pub fn prepare_segments(text: &str) -> AppResult<Vec<TextSegment>> {
    let normalized = normalize_for_speech(text);
    let segments = split_sentences(&normalized);
    if segments.is_empty() {
        return Err(AppError::NoSentences);
    }
    log::debug!("Split text into {} sentences", segments.len());
    Ok(segments)
}
