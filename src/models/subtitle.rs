use serde::{Deserialize, Serialize};

/// Структура для представления одной реплики субтитров.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Порядковый номер, начиная с 1
    pub index: usize,
    /// Начальное время в секундах
    pub start: f64,
    /// Конечное время в секундах
    pub end: f64,
    /// Текст реплики, строки разделены '\n'
    pub text: String,
}

impl SubtitleCue {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { index, start, end, text: text.into() }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Конец последней реплики (0.0 для пустой последовательности)
pub fn last_cue_end(cues: &[SubtitleCue]) -> f64 {
    cues.last().map(|c| c.end).unwrap_or(0.0)
}
