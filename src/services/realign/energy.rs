//! Поиск участков речи по энергии сигнала, когда распознавания нет.

use crate::models::SubtitleCue;
use crate::services::subtitles::standards::{MAX_CUE_DURATION, MIN_CUE_DURATION};

const FRAME_SECS: f64 = 0.128;
const HOP_SECS: f64 = 0.032;
const SILENCE_PERCENTILE: f64 = 30.0;
const MIN_SPAN_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechSpan {
    pub start: f64,
    pub end: f64,
}

/// Участки, где RMS кадра выше 30-го перцентиля. Короткие участки отбрасываются,
/// незакрытый участок заканчивается вместе с аудио.
pub fn detect_speech_spans(samples: &[f32], sample_rate: u32) -> Vec<SpeechSpan> {
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f64;
    let frame = ((FRAME_SECS * rate).round() as usize).max(1);
    let hop = ((HOP_SECS * rate).round() as usize).max(1);
    let total_duration = samples.len() as f64 / rate;

    let frame_count = if samples.len() >= frame { (samples.len() - frame) / hop + 1 } else { 1 };
    let energies: Vec<f64> = (0..frame_count)
        .map(|i| {
            let begin = i * hop;
            let end = (begin + frame).min(samples.len());
            rms(&samples[begin..end])
        })
        .collect();

    let threshold = percentile(&energies, SILENCE_PERCENTILE);
    let mut spans = Vec::new();
    let mut open: Option<f64> = None;

    for (i, energy) in energies.iter().enumerate() {
        let time = (i * hop) as f64 / rate;
        let speech = *energy > threshold;
        match (speech, open) {
            (true, None) => open = Some(time),
            (false, Some(start)) => {
                if time - start >= MIN_SPAN_SECS {
                    spans.push(SpeechSpan { start, end: time });
                }
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        if total_duration - start >= MIN_SPAN_SECS {
            spans.push(SpeechSpan { start, end: total_duration });
        }
    }
    spans
}

/// Переносит реплики на найденные участки речи
pub fn align_to_spans(cues: &[SubtitleCue], spans: &[SpeechSpan]) -> Option<Vec<SubtitleCue>> {
    let (first_span, last_span) = (spans.first()?, spans.last()?);
    let (first_cue, last_cue) = (cues.first()?, cues.last()?);

    if spans.len() == cues.len() {
        return Some(
            cues.iter()
                .zip(spans)
                .map(|(cue, span)| {
                    SubtitleCue::new(cue.index, span.start, span.end, cue.text.clone())
                })
                .collect(),
        );
    }

    let source_span = last_cue.end - first_cue.start;
    if source_span <= 0.0 {
        return None;
    }
    let scale = (last_span.end - first_span.start) / source_span;

    Some(
        cues.iter()
            .map(|cue| {
                let start = first_span.start + (cue.start - first_cue.start) * scale;
                let duration = (cue.duration() * scale).clamp(MIN_CUE_DURATION, MAX_CUE_DURATION);
                SubtitleCue::new(cue.index, start, start + duration, cue.text.clone())
            })
            .collect(),
    )
}

fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum / frame.len() as f64).sqrt()
}

// Линейная интерполяция между соседними рангами
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let position = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn tone(secs: f64) -> Vec<f32> {
        let n = (secs * RATE as f64) as usize;
        (0..n).map(|i| (i as f32 * 0.3).sin() * 0.5).collect()
    }

    fn quiet(secs: f64) -> Vec<f32> {
        vec![0.0; (secs * RATE as f64) as usize]
    }

    #[test]
    fn test_detects_two_spans() {
        let mut samples = quiet(1.0);
        samples.extend(tone(1.5));
        samples.extend(quiet(1.0));
        samples.extend(tone(2.0));
        samples.extend(quiet(1.0));

        let spans = detect_speech_spans(&samples, RATE);
        assert_eq!(spans.len(), 2, "Ожидались два участка речи: {spans:?}");
        assert!((spans[0].start - 1.0).abs() < 0.2);
        assert!((spans[1].start - 3.5).abs() < 0.2);
        assert!((spans[1].end - 5.5).abs() < 0.2);
    }

    #[test]
    fn test_open_span_closes_at_end() {
        let mut samples = quiet(2.0);
        samples.extend(tone(1.0));
        let spans = detect_speech_spans(&samples, RATE);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].end - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_silence_has_no_spans() {
        assert!(detect_speech_spans(&quiet(3.0), RATE).is_empty());
        assert!(detect_speech_spans(&[], RATE).is_empty());
    }

    #[test]
    fn test_equal_counts_take_span_bounds() {
        let cues = vec![SubtitleCue::new(1, 0.0, 1.0, "A."), SubtitleCue::new(2, 1.5, 2.0, "B.")];
        let spans = vec![SpeechSpan { start: 0.5, end: 1.8 }, SpeechSpan { start: 2.5, end: 4.0 }];
        let aligned = align_to_spans(&cues, &spans).unwrap();
        assert_eq!(aligned[0].start, 0.5);
        assert_eq!(aligned[1].end, 4.0);
    }

    #[test]
    fn test_mismatched_counts_distribute() {
        let cues = vec![
            SubtitleCue::new(1, 0.0, 2.0, "A."),
            SubtitleCue::new(2, 2.0, 4.0, "B."),
            SubtitleCue::new(3, 4.0, 6.0, "C."),
        ];
        let spans = vec![SpeechSpan { start: 1.0, end: 5.0 }, SpeechSpan { start: 6.0, end: 13.0 }];
        let aligned = align_to_spans(&cues, &spans).unwrap();

        // Шкала [0, 6] переносится на [1, 13] с коэффициентом 2
        assert_eq!(aligned[0].start, 1.0);
        assert_eq!(aligned[1].start, 5.0);
        assert_eq!(aligned[2].end, 13.0);
        assert!(align_to_spans(&cues, &[]).is_none());
    }
}
