use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Допустимое расхождение длительности журнала и реального аудио
pub const ACCEPTABLE_DURATION_DIFFERENCE: f64 = 0.5;

/// Итог пересинхронизации субтитров.
///
/// `Uncorrected` означает, что реплики записаны без изменения таймингов,
/// потому что сигнала для коррекции не было (распознавание не удалось и т.п.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RealignmentStatus {
    Corrected { strategy: String },
    Uncorrected { strategy: String, reason: String },
    NotNeeded,
}

impl RealignmentStatus {
    pub fn is_corrected(&self) -> bool {
        matches!(self, RealignmentStatus::Corrected { .. })
    }
}

/// Отчет о синхронизации журнала таймингов с аудиофайлом.
/// Не хранится, всегда пересчитывается из журнала и файла.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationReport {
    pub language: String,
    pub audio_file: PathBuf,
    pub is_acceptable: bool,
    pub actual_audio_duration: f64,
    pub expected_duration: f64,
    pub duration_difference: f64,
    pub total_segments: usize,
    pub successful_segments: usize,
    pub error_segments: usize,
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<RealignmentStatus>,
}

impl SynchronizationReport {
    pub fn with_correction(mut self, status: RealignmentStatus) -> Self {
        self.correction = Some(status);
        self
    }
}
