//! Подгонка длины видео под дорожку озвучки.
//!
//! Озвучка должна прозвучать целиком, поэтому итоговая длина всегда равна
//! длине аудио, а видео зацикливается или обрезается. Сам монтаж выполняет
//! кодировщик, здесь только план.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Допуск сравнения длительностей
pub const DURATION_EPSILON: f64 = 1e-6;

// Максимальный размер кадра для фильтра loop
const LOOP_FILTER_SIZE: u32 = 32767;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationMode {
    Loop,
    Trim,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub target_duration: f64,
    pub video_duration: f64,
    pub audio_duration: f64,
    pub mode: ReconciliationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u32>,
}

impl ReconciliationPlan {
    /// Фрагмент filtergraph ffmpeg для видеопотока. `None`, если менять ничего не нужно.
    pub fn video_filter(&self) -> Option<String> {
        match self.mode {
            ReconciliationMode::NoOp => None,
            ReconciliationMode::Trim => Some(format!(
                "trim=duration={:.3},setpts=PTS-STARTPTS",
                self.target_duration
            )),
            ReconciliationMode::Loop => {
                // loop=N означает N дополнительных повторов
                let extra = self.loop_count.unwrap_or(1).saturating_sub(1);
                Some(format!(
                    "loop=loop={}:size={}:start=0,trim=duration={:.3},setpts=PTS-STARTPTS",
                    extra, LOOP_FILTER_SIZE, self.target_duration
                ))
            }
        }
    }
}

/// Решает, зациклить или обрезать видео под длину озвучки
pub fn plan_reconciliation(
    video_duration: f64,
    audio_duration: f64,
) -> AppResult<ReconciliationPlan> {
    if !video_duration.is_finite() || video_duration <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "video duration must be positive, got {}",
            video_duration
        )));
    }
    if !audio_duration.is_finite() || audio_duration <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "audio duration must be positive, got {}",
            audio_duration
        )));
    }

    let (mode, loop_count) = if (audio_duration - video_duration).abs() <= DURATION_EPSILON {
        (ReconciliationMode::NoOp, None)
    } else if audio_duration > video_duration {
        let count = (audio_duration / video_duration).ceil() as u32;
        (ReconciliationMode::Loop, Some(count))
    } else {
        (ReconciliationMode::Trim, None)
    };

    log::info!(
        "Reconciliation: video {:.3}s, audio {:.3}s -> {:?}{}",
        video_duration,
        audio_duration,
        mode,
        loop_count.map(|c| format!(" x{}", c)).unwrap_or_default()
    );

    Ok(ReconciliationPlan {
        target_duration: audio_duration,
        video_duration,
        audio_duration,
        mode,
        loop_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longer_audio_loops() {
        let plan = plan_reconciliation(4.0, 10.0).unwrap();
        assert_eq!(plan.mode, ReconciliationMode::Loop);
        assert_eq!(plan.loop_count, Some(3));
        assert_eq!(plan.target_duration, 10.0);
        assert_eq!(
            plan.video_filter().unwrap(),
            "loop=loop=2:size=32767:start=0,trim=duration=10.000,setpts=PTS-STARTPTS"
        );
    }

    #[test]
    fn test_exact_multiple_loops_exactly() {
        let plan = plan_reconciliation(4.0, 8.0).unwrap();
        assert_eq!(plan.loop_count, Some(2));
    }

    #[test]
    fn test_shorter_audio_trims() {
        let plan = plan_reconciliation(10.0, 4.0).unwrap();
        assert_eq!(plan.mode, ReconciliationMode::Trim);
        assert_eq!(plan.loop_count, None);
        assert_eq!(plan.target_duration, 4.0);
        assert_eq!(plan.video_filter().unwrap(), "trim=duration=4.000,setpts=PTS-STARTPTS");
    }

    #[test]
    fn test_equal_durations_noop() {
        let plan = plan_reconciliation(5.0, 5.0).unwrap();
        assert_eq!(plan.mode, ReconciliationMode::NoOp);
        assert!(plan.video_filter().is_none());
        assert_eq!(plan_reconciliation(5.0, 5.0 + 1e-9).unwrap().mode, ReconciliationMode::NoOp);
    }

    #[test]
    fn test_invalid_video_duration() {
        assert!(plan_reconciliation(0.0, 5.0).is_err());
        assert!(plan_reconciliation(f64::NAN, 5.0).is_err());
    }
}
