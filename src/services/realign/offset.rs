//! Оценка постоянного сдвига субтитров по первой распознанной речи.

use crate::models::SubtitleCue;
use crate::services::transcription::Recognition;

/// Сдвиг и признак того, что он подкреплен распознанной речью
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetEstimate {
    pub offset: f64,
    pub recognized: bool,
}

impl OffsetEstimate {
    pub fn none() -> Self {
        Self { offset: 0.0, recognized: false }
    }
}

/// `offset = начало первой распознанной речи - начало первой реплики`.
/// Без распознанных сегментов сдвиг нулевой: данных для оценки недостаточно.
pub fn estimate_offset(cues: &[SubtitleCue], recognition: Option<&Recognition>) -> OffsetEstimate {
    let Some(first_cue) = cues.first() else {
        return OffsetEstimate::none();
    };
    match recognition.and_then(Recognition::first_speech_start) {
        Some(speech_start) => OffsetEstimate {
            offset: speech_start - first_cue.start,
            recognized: true,
        },
        None => OffsetEstimate::none(),
    }
}

/// Сдвигает все реплики; отрицательное начало переносится в ноль вместе с концом
pub fn apply_offset(cues: &[SubtitleCue], offset: f64) -> Vec<SubtitleCue> {
    cues.iter()
        .map(|cue| {
            let mut start = cue.start + offset;
            let mut end = cue.end + offset;
            if start < 0.0 {
                end -= start;
                start = 0.0;
            }
            SubtitleCue::new(cue.index, start, end, cue.text.clone())
        })
        .collect()
}
