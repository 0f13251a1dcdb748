//! Проверка журнала таймингов против реального аудиофайла.
//!
//! Никогда не возвращает ошибку: любой сбой отражается в отчете,
//! а вызывающий код решает, нужна ли пересинхронизация.

use log::{info, warn};

use crate::models::{SynchronizationReport, TimingLedger, ACCEPTABLE_DURATION_DIFFERENCE};
use crate::services::audio::MediaProbe;

pub fn validate_synchronization(
    ledger: &TimingLedger,
    probe: &dyn MediaProbe,
) -> SynchronizationReport {
    let total_segments = ledger.segments.len();
    let successful_segments = ledger.successful_segments();
    let error_segments = ledger.error_segments();
    let success_rate = if total_segments > 0 {
        successful_segments as f64 / total_segments as f64 * 100.0
    } else {
        0.0
    };

    let mut report = SynchronizationReport {
        language: ledger.language.clone(),
        audio_file: ledger.audio_file.clone(),
        is_acceptable: false,
        actual_audio_duration: 0.0,
        expected_duration: ledger.total_duration,
        duration_difference: 0.0,
        total_segments,
        successful_segments,
        error_segments,
        success_rate,
        error: None,
        correction: None,
    };

    if !ledger.audio_file.exists() {
        warn!("Audio file for {} not found: {}", ledger.language, ledger.audio_file.display());
        report.error = Some(format!("audio file not found: {}", ledger.audio_file.display()));
        return report;
    }

    match probe.duration(&ledger.audio_file) {
        Ok(actual) => {
            let difference = (actual - ledger.total_duration).abs();
            report.actual_audio_duration = actual;
            report.duration_difference = difference;
            report.is_acceptable = difference <= ACCEPTABLE_DURATION_DIFFERENCE;
            info!(
                "Sync check {}: expected {:.3}s, actual {:.3}s, difference {:.3}s, acceptable={}",
                ledger.language, ledger.total_duration, actual, difference, report.is_acceptable
            );
        }
        Err(e) => {
            warn!("Cannot read duration of {}: {}", ledger.audio_file.display(), e);
            report.error = Some(e.to_string());
        }
    }

    report
}
