//! Субтитры из журнала таймингов: одна реплика на каждый успешный сегмент.

use std::path::Path;

use log::info;

use super::srt::{to_srt_string, write_srt};
use crate::errors::AppResult;
use crate::models::{SegmentStatus, SubtitleCue, TimingLedger};

/// Реплики в порядке сегментов. Интервалы берутся из журнала без изменений,
/// сегменты с ошибкой синтеза реплик не дают.
pub fn compose_cues(ledger: &TimingLedger) -> Vec<SubtitleCue> {
    ledger
        .segments
        .iter()
        .filter(|segment| segment.status == SegmentStatus::Success)
        .enumerate()
        .map(|(i, segment)| {
            SubtitleCue::new(i + 1, segment.start_time, segment.end_time, segment.text.clone())
        })
        .collect()
}

pub fn compose_srt(ledger: &TimingLedger) -> String {
    to_srt_string(&compose_cues(ledger))
}

/// Пишет SRT для журнала и возвращает число реплик
pub fn write_subtitles(ledger: &TimingLedger, path: &Path) -> AppResult<usize> {
    let cues = compose_cues(ledger);
    write_srt(path, &cues)?;
    info!("Wrote {} cues for {} to {}", cues.len(), ledger.language, path.display());
    Ok(cues.len())
}
