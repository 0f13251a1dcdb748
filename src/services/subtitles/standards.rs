//! # Subtitle standards
//!
//! Ограничения на отображение реплик (по мотивам требований стриминговых
//! платформ) и оценка соответствия им.
//!
//! Форматирование идемпотентно: все времена приводятся к целым миллисекундам,
//! поэтому повторный прогон ничего не меняет ни в моделях, ни в SRT.

use serde::{Deserialize, Serialize};

use crate::models::SubtitleCue;

/// Минимальная длительность реплики, секунды
pub const MIN_CUE_DURATION: f64 = 0.833;
/// Максимальная длительность реплики, секунды
pub const MAX_CUE_DURATION: f64 = 7.0;
/// Минимальный промежуток между репликами, секунды
pub const MIN_CUE_GAP: f64 = 0.125;
/// Максимальная длина строки
pub const MAX_LINE_CHARS: usize = 42;

/// Минимальная доля реплик, укладывающихся в ограничения
pub const MIN_PASS_RATIO: f64 = 0.80;
/// Конец последней реплики должен отличаться от длины аудио не более чем на 5%
pub const MIN_SYNC_RATIO: f64 = 0.95;

const MIN_DURATION_MS: i64 = 833;
const MAX_DURATION_MS: i64 = 7000;
const MIN_GAP_MS: i64 = 125;

fn to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

fn from_ms(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Результат проверки последовательности реплик
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsAssessment {
    pub total_cues: usize,
    pub duration_violations: usize,
    pub gap_violations: usize,
    pub long_lines: usize,
    pub pass_ratio: f64,
    pub last_cue_end: f64,
    pub audio_duration: f64,
    pub sync_ratio: f64,
    pub compliant: bool,
}

/// Оценивает реплики до форматирования.
///
/// Доля прохождения: реплики с длительностью в границах, минус половина
/// за каждое нарушение промежутка, деленные на общее число реплик.
pub fn assess(cues: &[SubtitleCue], audio_duration: f64) -> StandardsAssessment {
    let total = cues.len();
    let within_bounds = cues
        .iter()
        .filter(|c| {
            let d = to_ms(c.end) - to_ms(c.start);
            (MIN_DURATION_MS..=MAX_DURATION_MS).contains(&d)
        })
        .count();
    let gap_violations = cues
        .windows(2)
        .filter(|pair| to_ms(pair[1].start) - to_ms(pair[0].end) < MIN_GAP_MS)
        .count();
    let long_lines = cues
        .iter()
        .flat_map(|c| c.text.lines())
        .filter(|line| line.chars().count() > MAX_LINE_CHARS)
        .count();

    let pass_ratio = if total == 0 {
        0.0
    } else {
        ((within_bounds as f64 - 0.5 * gap_violations as f64) / total as f64).max(0.0)
    };

    let last_cue_end = cues.last().map(|c| c.end).unwrap_or(0.0);
    let longer = last_cue_end.max(audio_duration);
    let sync_ratio =
        if longer > 0.0 { last_cue_end.min(audio_duration).max(0.0) / longer } else { 0.0 };

    StandardsAssessment {
        total_cues: total,
        duration_violations: total - within_bounds,
        gap_violations,
        long_lines,
        pass_ratio,
        last_cue_end,
        audio_duration,
        sync_ratio,
        compliant: pass_ratio >= MIN_PASS_RATIO && sync_ratio >= MIN_SYNC_RATIO,
    }
}

/// Приводит реплики к ограничениям: длительность в [0.833, 7.0],
/// промежуток не меньше 0.125 (делится симметрично вокруг середины),
/// строки не длиннее 42 символов. Номера реплик пересчитываются с 1.
///
/// Если симметричное деление сделало бы реплику короче минимума,
/// вместо этого сдвигается начало следующей реплики.
pub fn format_cues(cues: &[SubtitleCue]) -> Vec<SubtitleCue> {
    let mut spans: Vec<(i64, i64)> = cues.iter().map(|c| (to_ms(c.start), to_ms(c.end))).collect();

    for i in 0..spans.len() {
        let (start, mut end) = spans[i];
        if end - start < MIN_DURATION_MS {
            end = start + MIN_DURATION_MS;
        }
        if end - start > MAX_DURATION_MS {
            end = start + MAX_DURATION_MS;
        }
        spans[i].1 = end;

        if let Some(next) = spans.get(i + 1).copied() {
            if next.0 - end < MIN_GAP_MS {
                let split_end = (end + next.0 - MIN_GAP_MS).div_euclid(2);
                if split_end - start >= MIN_DURATION_MS {
                    spans[i].1 = split_end;
                    spans[i + 1].0 = split_end + MIN_GAP_MS;
                } else {
                    spans[i + 1].0 = end + MIN_GAP_MS;
                }
            }
        }
    }

    cues.iter()
        .zip(spans)
        .enumerate()
        .map(|(i, (cue, (start, end)))| {
            let text = wrap_text(&cue.text, MAX_LINE_CHARS);
            SubtitleCue::new(i + 1, from_ms(start), from_ms(end), text)
        })
        .collect()
}

/// Жадный перенос: строки длиннее лимита переразбиваются по словам,
/// короткие строки остаются как есть.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        if line.chars().count() <= max_chars {
            lines.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if candidate_len > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::subtitles::srt::to_srt_string;

    fn cue(start: f64, end: f64, text: &str) -> SubtitleCue {
        SubtitleCue::new(1, start, end, text)
    }

    #[test]
    fn test_short_cue_extended_long_cue_clamped() {
        let formatted = format_cues(&[cue(0.0, 0.4, "Short."), cue(2.0, 12.0, "Very long.")]);
        assert_eq!(formatted[0].end, 0.833);
        assert_eq!(formatted[1].end, 9.0);
        assert_eq!(formatted[1].index, 2);
    }

    #[test]
    fn test_gap_split_symmetrically() {
        let formatted = format_cues(&[cue(0.0, 2.0, "One."), cue(2.05, 4.0, "Two.")]);
        // Середина 2.025: конец первой 1.962, начало второй 2.087
        assert_eq!(formatted[0].end, 1.962);
        assert_eq!(formatted[1].start, 2.087);
        assert!(formatted[1].start - formatted[0].end >= MIN_CUE_GAP - 1e-9);
    }

    #[test]
    fn test_gap_fix_never_shortens_below_minimum() {
        let formatted = format_cues(&[cue(0.0, 0.5, "A."), cue(0.6, 2.0, "B.")]);
        assert_eq!(formatted[0].end, 0.833);
        assert_eq!(formatted[1].start, 0.958);
        assert!(formatted[1].end - formatted[1].start >= MIN_CUE_DURATION);
    }

    #[test]
    fn test_formatter_is_idempotent() {
        let cues = vec![
            cue(0.0, 0.3, "Tiny."),
            cue(0.31, 0.9, "Overlapping with previous after extension."),
            cue(1.0, 9.5, "This line is definitely longer than forty two characters in total."),
            cue(9.55, 10.0, "Close."),
            cue(10.1, 10.2, "Last."),
        ];
        let once = format_cues(&cues);
        let twice = format_cues(&once);
        assert_eq!(once, twice);
        assert_eq!(to_srt_string(&once), to_srt_string(&twice));

        for pair in once.windows(2) {
            assert!(pair[1].start - pair[0].end >= MIN_CUE_GAP - 1e-9, "{:?}", pair);
        }
        for c in &once {
            let d = c.duration();
            assert!(d >= MIN_CUE_DURATION - 1e-9 && d <= MAX_CUE_DURATION + 1e-9, "{:?}", c);
        }
    }

    #[test]
    fn test_wrap_text() {
        let line = "This line is definitely longer than forty two characters in total.";
        let wrapped = wrap_text(line, 42);
        assert!(wrapped.lines().all(|l| l.chars().count() <= 42), "{}", wrapped);
        assert_eq!(wrapped.replace('\n', " "), line);
        assert_eq!(wrap_text("Short\nlines", 42), "Short\nlines");
        assert_eq!(wrap_text(&wrapped, 42), wrapped);
    }

    #[test]
    fn test_assessment_pass_ratio() {
        let cues = vec![
            cue(0.0, 1.0, "Ok."),
            cue(1.05, 2.0, "Gap too small."),
            cue(2.5, 2.6, "Too short."),
            cue(3.0, 5.0, "Ok."),
        ];
        let assessment = assess(&cues, 5.0);
        assert_eq!(assessment.duration_violations, 1);
        assert_eq!(assessment.gap_violations, 1);
        // (3 - 0.5) / 4
        assert!((assessment.pass_ratio - 0.625).abs() < 1e-9);
        assert!(!assessment.compliant);
    }

    #[test]
    fn test_assessment_sync_ratio() {
        let cues = vec![cue(0.0, 2.0, "A."), cue(2.5, 4.0, "B."), cue(4.5, 9.6, "C.")];
        assert!(assess(&cues, 10.0).compliant);
        assert!(!assess(&cues, 11.0).compliant, "Конец реплик дальше 5% от длины аудио");
        assert!(!assess(&[], 10.0).compliant);
    }
}
