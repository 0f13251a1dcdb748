//! # Timing ledger
//!
//! Журнал таймингов дорожки одного языка. Пишется один раз сборщиком
//! и дальше только читается: по нему строятся субтитры и отчет о синхронизации.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Пауза между соседними предложениями
pub const INTER_SEGMENT_SILENCE: f64 = 0.3;

/// Округление до миллисекунд
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSegment {
    pub index: usize,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub status: SegmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingLedger {
    pub language: String,
    pub total_duration: f64,
    pub total_segments: usize,
    pub audio_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub segments: Vec<TimingSegment>,
}

impl TimingLedger {
    pub fn new(
        language: impl Into<String>,
        audio_file: PathBuf,
        segments: Vec<TimingSegment>,
        total_duration: f64,
    ) -> Self {
        Self {
            language: language.into(),
            total_duration,
            total_segments: segments.len(),
            audio_file,
            created_at: Some(Utc::now()),
            segments,
        }
    }

    pub fn successful_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.status == SegmentStatus::Success).count()
    }

    pub fn error_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.status == SegmentStatus::Error).count()
    }

    /// Сохраняет журнал в JSON
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Загружает журнал из JSON
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::MissingInputFile(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let mut ledger: TimingLedger = serde_json::from_str(&raw)?;
        if ledger.total_segments != ledger.segments.len() {
            log::warn!(
                "Ledger {} declares {} segments but lists {}",
                path.display(),
                ledger.total_segments,
                ledger.segments.len()
            );
            ledger.total_segments = ledger.segments.len();
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_ledger() -> TimingLedger {
        let segments = vec![
            TimingSegment {
                index: 1,
                text: "Hello world.".to_string(),
                start_time: 0.0,
                end_time: 1.2,
                duration: 1.2,
                status: SegmentStatus::Success,
                error: None,
            },
            TimingSegment {
                index: 2,
                text: "Broken.".to_string(),
                start_time: 1.5,
                end_time: 2.5,
                duration: 1.0,
                status: SegmentStatus::Error,
                error: Some("quota exceeded".to_string()),
            },
        ];
        TimingLedger::new("en", PathBuf::from("narration_en.wav"), segments, 2.5)
    }

    #[test]
    fn test_ledger_json_layout() {
        let ledger = sample_ledger();
        let value = serde_json::to_value(&ledger).unwrap();

        assert_eq!(value["language"], "en");
        assert_eq!(value["total_segments"], 2);
        assert_eq!(value["audio_file"], "narration_en.wav");
        assert_eq!(value["segments"][0]["start_time"], 0.0);
        assert_eq!(value["segments"][0]["status"], "success");
        assert!(value["segments"][0].get("error").is_none());
        assert_eq!(value["segments"][1]["status"], "error");
        assert_eq!(value["segments"][1]["error"], "quota exceeded");
    }

    #[test]
    fn test_ledger_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let ledger = sample_ledger();
        ledger.save(&path).unwrap();

        let loaded = TimingLedger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.successful_segments(), 1);
        assert_eq!(loaded.error_segments(), 1);
    }

    #[test]
    fn test_ledger_without_created_at() {
        let raw = r#"{"language":"tr","total_duration":1.0,"total_segments":1,"audio_file":"a.wav",
            "segments":[{"index":1,"text":"Merhaba.","start_time":0.0,"end_time":1.0,
                "duration":1.0,"status":"success"}]}"#;
        let ledger: TimingLedger = serde_json::from_str(raw).unwrap();
        assert!(ledger.created_at.is_none());
        assert_eq!(ledger.segments[0].status, SegmentStatus::Success);
    }

    #[test]
    fn test_round_millis() {
        assert_eq!(round_millis(1.23449), 1.234);
        assert_eq!(round_millis(2.0004), 2.0);
    }
}
