//! # Subtitle realignment
//!
//! Пересинхронизация готовых субтитров с аудио. Каждая стратегия является
//! чистой функцией над репликами и собранными свидетельствами
//! (длина аудио, распознанная речь, сам сигнал). Движок собирает
//! свидетельства, выбирает стратегию и пишет результат в новый файл
//! `{stem}_synced.srt`; исходный файл не трогается.

pub mod energy;
pub mod forced;
pub mod offset;
pub mod similarity;
pub mod warp;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{RealignConfig, RealignStrategy};
use crate::errors::{AppError, AppResult};
use crate::models::{last_cue_end, RealignmentStatus, SubtitleCue};
use crate::services::audio::format::decode_audio_file;
use crate::services::audio::MediaProbe;
use crate::services::subtitles::{assess, format_cues, read_srt, write_srt, StandardsAssessment};
use crate::services::transcription::{Recognition, SpeechRecognizer};

pub use energy::{align_to_spans, detect_speech_spans, SpeechSpan};
pub use forced::{ForcedAligner, ForcedAlignment};
pub use offset::{apply_offset, estimate_offset, OffsetEstimate};
pub use similarity::{normalize_for_matching, similarity_ratio};
pub use warp::{proportional_rescale, AdaptiveWarper, WarpResult};

/// Моно сигнал для энергетического выравнивания
#[derive(Debug, Clone)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Все, что известно об аудио на момент выравнивания
#[derive(Debug, Clone, Default)]
pub struct AlignmentEvidence {
    pub audio_duration: f64,
    pub recognition: Option<Recognition>,
    pub audio: Option<MonoAudio>,
}

impl AlignmentEvidence {
    pub fn new(audio_duration: f64) -> Self {
        Self { audio_duration, ..Default::default() }
    }

    pub fn with_recognition(mut self, recognition: Recognition) -> Self {
        self.recognition = Some(recognition);
        self
    }

    pub fn with_audio(mut self, samples: Vec<f32>, sample_rate: u32) -> Self {
        self.audio = Some(MonoAudio { samples, sample_rate });
        self
    }

    fn has_words(&self) -> bool {
        self.recognition.as_ref().is_some_and(|r| !r.words.is_empty())
    }

    fn has_segments(&self) -> bool {
        self.recognition.as_ref().is_some_and(|r| !r.segments.is_empty())
    }
}

/// Реплики после стратегии и ее итог
#[derive(Debug, Clone)]
pub struct Realignment {
    pub cues: Vec<SubtitleCue>,
    pub status: RealignmentStatus,
}

/// Стратегия пересинхронизации
#[derive(Debug, Clone, Copy)]
pub enum Realigner {
    Offset,
    AdaptiveWarp(AdaptiveWarper),
    ForcedAlignment(ForcedAligner),
    Proportional,
    EnergyAlignment,
}

impl Realigner {
    pub fn name(&self) -> &'static str {
        match self {
            Realigner::Offset => "offset",
            Realigner::AdaptiveWarp(_) => "adaptive_warp",
            Realigner::ForcedAlignment(_) => "forced_alignment",
            Realigner::Proportional => "proportional",
            Realigner::EnergyAlignment => "energy",
        }
    }

    /// Явно заданная стратегия; для `Auto` выбирает по свидетельствам
    pub fn for_strategy(
        strategy: RealignStrategy,
        evidence: &AlignmentEvidence,
        config: &RealignConfig,
    ) -> Self {
        let warper = AdaptiveWarper { threshold: config.warp_threshold_secs };
        let aligner = ForcedAligner { threshold: config.similarity_threshold };
        match strategy {
            RealignStrategy::Offset => Realigner::Offset,
            RealignStrategy::AdaptiveWarp => Realigner::AdaptiveWarp(warper),
            RealignStrategy::ForcedAlignment => Realigner::ForcedAlignment(aligner),
            RealignStrategy::Proportional => Realigner::Proportional,
            RealignStrategy::Energy => Realigner::EnergyAlignment,
            RealignStrategy::Auto if evidence.has_words() => Realigner::ForcedAlignment(aligner),
            RealignStrategy::Auto if evidence.has_segments() => Realigner::AdaptiveWarp(warper),
            RealignStrategy::Auto if evidence.audio.is_some() => Realigner::EnergyAlignment,
            RealignStrategy::Auto => Realigner::Proportional,
        }
    }

    pub fn realign(&self, cues: &[SubtitleCue], evidence: &AlignmentEvidence) -> Realignment {
        let strategy = self.name().to_string();
        let unchanged = |reason: &str| Realignment {
            cues: cues.to_vec(),
            status: RealignmentStatus::Uncorrected {
                strategy: strategy.clone(),
                reason: reason.to_string(),
            },
        };
        let corrected = |cues: Vec<SubtitleCue>| Realignment {
            cues,
            status: RealignmentStatus::Corrected { strategy: strategy.clone() },
        };

        match self {
            Realigner::Offset => {
                let estimate = estimate_offset(cues, evidence.recognition.as_ref());
                if !estimate.recognized {
                    return unchanged("no recognized speech");
                }
                debug!("Estimated subtitle offset: {:.3}s", estimate.offset);
                corrected(apply_offset(cues, estimate.offset))
            }
            Realigner::AdaptiveWarp(warper) => {
                let estimate = estimate_offset(cues, evidence.recognition.as_ref());
                let result = warper.warp(cues, estimate.offset, evidence.audio_duration);
                debug!(
                    "Adaptive warp: offset {:.3}s, rescaled: {}",
                    estimate.offset, result.rescaled
                );
                if estimate.recognized || result.rescaled {
                    corrected(result.cues)
                } else {
                    unchanged("no recognized speech and drift below warp threshold")
                }
            }
            Realigner::ForcedAlignment(aligner) => {
                let words =
                    evidence.recognition.as_ref().map(|r| r.words.as_slice()).unwrap_or(&[]);
                if words.is_empty() {
                    return unchanged("no word timestamps");
                }
                let result = aligner.align(cues, words);
                debug!("Forced alignment matched {}/{} cues", result.matched, cues.len());
                if result.matched == 0 {
                    unchanged("no cue matched recognized words")
                } else {
                    corrected(result.cues)
                }
            }
            Realigner::Proportional => match proportional_rescale(cues, evidence.audio_duration) {
                Some(scaled) => corrected(scaled),
                None => unchanged("nothing to rescale"),
            },
            Realigner::EnergyAlignment => {
                let Some(audio) = evidence.audio.as_ref() else {
                    return unchanged("audio samples unavailable");
                };
                let spans = detect_speech_spans(&audio.samples, audio.sample_rate);
                debug!("Detected {} speech spans for {} cues", spans.len(), cues.len());
                match align_to_spans(cues, &spans) {
                    Some(aligned) => corrected(aligned),
                    None => unchanged("no speech spans detected"),
                }
            }
        }
    }
}

/// Итог пересинхронизации одного файла
#[derive(Debug, Clone, Serialize)]
pub struct RealignmentOutcome {
    pub input_path: PathBuf,
    /// None, если коррекция не потребовалась и файл не писался
    pub output_path: Option<PathBuf>,
    pub status: RealignmentStatus,
    pub assessment: StandardsAssessment,
    #[serde(skip)]
    pub cues: Vec<SubtitleCue>,
}

/// Путь `{stem}_synced.srt` рядом с исходным файлом
pub fn synced_output_path(subtitle_path: &Path) -> PathBuf {
    let stem = subtitle_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("subtitles");
    subtitle_path.with_file_name(format!("{}_synced.srt", stem))
}

/// Собирает свидетельства и применяет выбранную стратегию к SRT файлу
pub struct RealignmentEngine {
    config: RealignConfig,
    probe: Box<dyn MediaProbe>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
}

impl RealignmentEngine {
    pub fn new(config: RealignConfig, probe: Box<dyn MediaProbe>) -> Self {
        Self { config, probe, recognizer: None }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub async fn realign_file(
        &self,
        subtitle_path: &Path,
        audio_path: &Path,
        language: Option<&str>,
    ) -> AppResult<RealignmentOutcome> {
        let cues = read_srt(subtitle_path)?;
        if cues.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "{} contains no cues",
                subtitle_path.display()
            )));
        }
        let audio_duration = self.probe.duration(audio_path)?;
        let strategy = self.config.strategy;

        let drift = (last_cue_end(&cues) - audio_duration).abs();
        info!(
            "Realigning {} against {} ({:.3}s drift, strategy {})",
            subtitle_path.display(),
            audio_path.display(),
            drift,
            strategy.as_str()
        );

        if strategy == RealignStrategy::Auto && drift <= self.config.trigger_tolerance_secs {
            info!("Drift within tolerance, subtitles left as is");
            return Ok(RealignmentOutcome {
                input_path: subtitle_path.to_path_buf(),
                output_path: None,
                status: RealignmentStatus::NotNeeded,
                assessment: assess(&cues, audio_duration),
                cues,
            });
        }

        let evidence = self.gather_evidence(strategy, audio_path, audio_duration, language).await;
        let realigner = Realigner::for_strategy(strategy, &evidence, &self.config);
        let mut result = realigner.realign(&cues, &evidence);

        if strategy == RealignStrategy::Auto && !result.status.is_corrected() {
            if let Realigner::EnergyAlignment = realigner {
                debug!("Energy alignment found nothing, falling back to proportional rescale");
                result = Realigner::Proportional.realign(&cues, &evidence);
            }
        }

        let assessment = assess(&result.cues, audio_duration);
        let final_cues =
            if self.config.apply_standards { format_cues(&result.cues) } else { result.cues };

        let output_path = synced_output_path(subtitle_path);
        write_srt(&output_path, &final_cues)?;

        match &result.status {
            RealignmentStatus::Uncorrected { strategy, reason } => {
                warn!("{} left timings unchanged: {}", strategy, reason)
            }
            _ => info!("Wrote realigned subtitles to {}", output_path.display()),
        }

        Ok(RealignmentOutcome {
            input_path: subtitle_path.to_path_buf(),
            output_path: Some(output_path),
            status: result.status,
            assessment,
            cues: final_cues,
        })
    }

    async fn gather_evidence(
        &self,
        strategy: RealignStrategy,
        audio_path: &Path,
        audio_duration: f64,
        language: Option<&str>,
    ) -> AlignmentEvidence {
        let mut evidence = AlignmentEvidence::new(audio_duration);

        let wants_recognition = matches!(
            strategy,
            RealignStrategy::Auto
                | RealignStrategy::Offset
                | RealignStrategy::AdaptiveWarp
                | RealignStrategy::ForcedAlignment
        );
        let wants_words =
            matches!(strategy, RealignStrategy::Auto | RealignStrategy::ForcedAlignment);

        if wants_recognition {
            match &self.recognizer {
                Some(recognizer) => {
                    match recognizer.recognize(audio_path, language, wants_words).await {
                        Ok(recognition) if !recognition.is_empty() => {
                            evidence.recognition = Some(recognition)
                        }
                        Ok(_) => {
                            warn!("Recognition returned no speech for {}", audio_path.display())
                        }
                        Err(e) => warn!("Recognition failed, continuing without it: {}", e),
                    }
                }
                None => debug!("No speech recognizer configured"),
            }
        }

        let wants_samples = matches!(strategy, RealignStrategy::Energy)
            || (strategy == RealignStrategy::Auto && evidence.recognition.is_none());
        if wants_samples {
            let path = audio_path.to_path_buf();
            match tokio::task::spawn_blocking(move || decode_audio_file(&path)).await {
                Ok(Ok((samples, rate))) => {
                    evidence.audio = Some(MonoAudio { samples, sample_rate: rate })
                }
                Ok(Err(e)) => {
                    warn!("Could not decode {} for energy analysis: {}", audio_path.display(), e)
                }
                Err(e) => warn!("Audio decoding task failed: {}", e),
            }
        }

        evidence
    }
}
