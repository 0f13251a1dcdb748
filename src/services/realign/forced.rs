//! Принудительное выравнивание по пословным меткам распознавания.

use crate::models::SubtitleCue;
use crate::services::transcription::RecognizedWord;

use super::similarity::{normalize_for_matching, similarity_ratio};

/// Итог выравнивания: новые реплики и число реплик, нашедших совпадение
#[derive(Debug, Clone)]
pub struct ForcedAlignment {
    pub cues: Vec<SubtitleCue>,
    pub matched: usize,
}

/// Для каждой реплики ищет окно распознанных слов той же длины с наибольшим
/// сходством текста. Реплика получает границы окна, если сходство выше порога;
/// иначе сохраняет свои исходные тайминги.
#[derive(Debug, Clone, Copy)]
pub struct ForcedAligner {
    pub threshold: f64,
}

impl Default for ForcedAligner {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

impl ForcedAligner {
    pub fn align(&self, cues: &[SubtitleCue], words: &[RecognizedWord]) -> ForcedAlignment {
        let normalized: Vec<String> =
            words.iter().map(|w| normalize_for_matching(&w.text)).collect();
        let mut matched = 0;

        let aligned = cues
            .iter()
            .map(|cue| match self.best_window(cue, &normalized) {
                Some((first, last)) => {
                    matched += 1;
                    let (start, end) = (words[first].start, words[last].end);
                    SubtitleCue::new(cue.index, start, end, cue.text.clone())
                }
                None => cue.clone(),
            })
            .collect();

        ForcedAlignment { cues: aligned, matched }
    }

    // Первое окно со строго лучшим сходством; None, если ни одно не превысило порог
    fn best_window(&self, cue: &SubtitleCue, words: &[String]) -> Option<(usize, usize)> {
        let cue_text = normalize_for_matching(&cue.text);
        let width = cue_text.split(' ').filter(|w| !w.is_empty()).count();
        if width == 0 || words.len() < width {
            return None;
        }

        let mut best_score = self.threshold;
        let mut best = None;
        for start in 0..=words.len() - width {
            let window = words[start..start + width].join(" ");
            let score = similarity_ratio(&cue_text, &window);
            if score > best_score {
                best_score = score;
                best = Some((start, start + width - 1));
            }
        }
        best
    }
}
