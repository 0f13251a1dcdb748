//! Масштабирование временной шкалы субтитров под реальную длину аудио.

use crate::models::{last_cue_end, SubtitleCue};
use crate::services::subtitles::standards::{MAX_CUE_DURATION, MIN_CUE_DURATION};

/// Результат нелинейного масштабирования
#[derive(Debug, Clone)]
pub struct WarpResult {
    pub cues: Vec<SubtitleCue>,
    pub rescaled: bool,
}

/// Сдвиг плюс нелинейное растяжение, сильнее к концу шкалы:
/// `scale(t) = 1 + (audio / last_end - 1) * (t / last_end)^1.5`.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveWarper {
    /// Растяжение включается, только если конец последней реплики
    /// расходится с длиной аудио сильнее этого порога
    pub threshold: f64,
}

impl Default for AdaptiveWarper {
    fn default() -> Self {
        Self { threshold: 5.0 }
    }
}

impl AdaptiveWarper {
    pub fn warp(&self, cues: &[SubtitleCue], offset: f64, audio_duration: f64) -> WarpResult {
        let last_end = last_cue_end(cues);
        let rescale = last_end > 0.0 && (last_end - audio_duration).abs() > self.threshold;
        let ratio = if last_end > 0.0 { audio_duration / last_end } else { 1.0 };

        let warped = cues
            .iter()
            .map(|cue| {
                let mut start = cue.start + offset;
                let mut end = cue.end + offset;

                if rescale {
                    let progress = (start / last_end).max(0.0);
                    let scale = 1.0 + (ratio - 1.0) * progress.powf(1.5);
                    start *= scale;
                    end *= scale;
                }

                let duration = (end - start).clamp(MIN_CUE_DURATION, MAX_CUE_DURATION);
                end = start + duration;

                if start < 0.0 {
                    end -= start;
                    start = 0.0;
                }
                SubtitleCue::new(cue.index, start, end, cue.text.clone())
            })
            .collect();

        WarpResult { cues: warped, rescaled: rescale }
    }
}

/// Линейное растяжение `audio / last_end` для случая без распознавания
pub fn proportional_rescale(cues: &[SubtitleCue], audio_duration: f64) -> Option<Vec<SubtitleCue>> {
    let last_end = last_cue_end(cues);
    if last_end <= 0.0 || audio_duration <= 0.0 {
        return None;
    }
    let ratio = audio_duration / last_end;
    Some(
        cues.iter()
            .map(|cue| {
                SubtitleCue::new(cue.index, cue.start * ratio, cue.end * ratio, cue.text.clone())
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cues() -> Vec<SubtitleCue> {
        vec![
            SubtitleCue::new(1, 0.0, 2.0, "A."),
            SubtitleCue::new(2, 10.0, 12.0, "B."),
            SubtitleCue::new(3, 18.0, 20.0, "C."),
        ]
    }

    #[test]
    fn test_small_drift_only_shifts() {
        let warper = AdaptiveWarper::default();
        let result = warper.warp(&cues(), 0.5, 22.0);
        assert!(!result.rescaled);
        assert!((result.cues[1].start - 10.5).abs() < 1e-9);
        assert!((result.cues[2].end - 20.5).abs() < 1e-9);
    }

    #[test]
    fn test_large_drift_rescales_later_cues_more() {
        let warper = AdaptiveWarper::default();
        let result = warper.warp(&cues(), 0.0, 30.0);
        assert!(result.rescaled);

        // Первая реплика (t = 0) не двигается
        assert_eq!(result.cues[0].start, 0.0);
        // t = 10: scale = 1 + 0.5 * 0.5^1.5
        let expected = 10.0 * (1.0 + 0.5 * 0.5_f64.powf(1.5));
        assert!((result.cues[1].start - expected).abs() < 1e-9);
        // t = 18: scale = 1 + 0.5 * 0.9^1.5
        let expected = 18.0 * (1.0 + 0.5 * 0.9_f64.powf(1.5));
        assert!((result.cues[2].start - expected).abs() < 1e-9);
        assert!(result.cues[2].start - 18.0 > result.cues[1].start - 10.0);
    }

    #[test]
    fn test_durations_clamped_and_negative_start_shifted() {
        let cues = vec![
            SubtitleCue::new(1, 0.5, 0.6, "Tiny."),
            SubtitleCue::new(2, 1.0, 15.0, "Huge."),
        ];
        let result = AdaptiveWarper::default().warp(&cues, -1.0, 15.0);

        assert_eq!(result.cues[0].start, 0.0);
        assert!((result.cues[0].duration() - MIN_CUE_DURATION).abs() < 1e-9);
        assert!((result.cues[1].duration() - MAX_CUE_DURATION).abs() < 1e-9);
    }

    #[test]
    fn test_proportional_rescale() {
        let scaled = proportional_rescale(&cues(), 40.0).unwrap();
        assert_eq!(scaled[1].start, 20.0);
        assert_eq!(scaled[2].end, 40.0);
        assert!(proportional_rescale(&[], 10.0).is_none());
    }
}
