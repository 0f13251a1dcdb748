use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::TempPath;

/// Секунд на символ для оценки длительности несинтезированного предложения
pub const SECONDS_PER_CHAR: f64 = 0.08;

/// Минимальная оценочная длительность
pub const MIN_ESTIMATED_DURATION: f64 = 1.0;

/// Одно предложение исходного текста.
///
/// Индекс начинается с 1 и задает порядок на временной шкале.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub index: usize,
    pub text: String,
}

impl TextSegment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }
}

/// Декодированный звук одного предложения (моно, f32).
///
/// Держит временные файлы, из которых он был декодирован: они удаляются
/// вместе с этим значением, то есть когда сборщик дорожки его поглотит.
#[derive(Debug)]
pub struct SegmentAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    artifacts: Vec<TempPath>,
}

impl SegmentAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate, artifacts: Vec::new() }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<TempPath>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn artifact_paths(&self) -> Vec<&Path> {
        self.artifacts.iter().map(|p| p.as_ref()).collect()
    }
}

/// Результат синтеза одного предложения
#[derive(Debug)]
pub enum SynthesisResult {
    Success {
        index: usize,
        text: String,
        audio: SegmentAudio,
        duration: f64,
    },
    Failure {
        index: usize,
        text: String,
        estimated_duration: f64,
        error: String,
    },
}

impl SynthesisResult {
    /// Неудача с оценкой длительности по длине текста
    pub fn failure(segment: &TextSegment, error: impl Into<String>) -> Self {
        SynthesisResult::Failure {
            index: segment.index,
            text: segment.text.clone(),
            estimated_duration: estimate_duration(&segment.text),
            error: error.into(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            SynthesisResult::Success { index, .. } | SynthesisResult::Failure { index, .. } => {
                *index
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SynthesisResult::Success { text, .. } | SynthesisResult::Failure { text, .. } => text,
        }
    }

    /// Реальная или оценочная длительность
    pub fn duration(&self) -> f64 {
        match self {
            SynthesisResult::Success { duration, .. } => *duration,
            SynthesisResult::Failure { estimated_duration, .. } => *estimated_duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SynthesisResult::Success { .. })
    }
}

/// Оценка длительности речи по количеству символов, не меньше одной секунды
pub fn estimate_duration(text: &str) -> f64 {
    (text.chars().count() as f64 * SECONDS_PER_CHAR).max(MIN_ESTIMATED_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_duration_floor() {
        assert_eq!(estimate_duration("Hi."), 1.0);
        assert_eq!(estimate_duration(""), 1.0);
    }

    #[test]
    fn test_estimate_duration_counts_chars() {
        let text = "a".repeat(50);
        assert!((estimate_duration(&text) - 4.0).abs() < 1e-9);
        // Кириллица считается по символам, а не по байтам
        let text = "я".repeat(25);
        assert!((estimate_duration(&text) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_failure_carries_estimate() {
        let segment = TextSegment::new(3, "x".repeat(20));
        let result = SynthesisResult::failure(&segment, "quota");
        assert_eq!(result.index(), 3);
        assert!(!result.is_success());
        assert!((result.duration() - 1.6).abs() < 1e-9);
    }
}
