//! # Track assembler
//!
//! Склеивает синтезированные предложения в одну дорожку с паузой 0.3 с
//! между ними и ведет журнал таймингов. Это единственное место, где
//! считаются границы сегментов: субтитры и проверки только читают журнал.

use std::path::Path;

use log::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{
    round_millis, SegmentAudio, SegmentStatus, SynthesisResult, TimingLedger, TimingSegment,
    INTER_SEGMENT_SILENCE,
};
use crate::services::audio::format::{
    encode_wav, fit_to_length, resample, samples_for_duration, silence,
};

/// Дорожка в памяти вместе с таймингами
#[derive(Debug)]
pub struct AssembledTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub segments: Vec<TimingSegment>,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackAssembler {
    sample_rate: u32,
}

impl TrackAssembler {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Проходит результаты по порядку индексов с единственным счетчиком времени.
    ///
    /// Результаты поглощаются: временные файлы сегментов удаляются по мере склейки.
    pub fn assemble_in_memory(&self, results: Vec<SynthesisResult>) -> AppResult<AssembledTrack> {
        if results.is_empty() {
            return Err(AppError::NoSegments);
        }
        if results.windows(2).any(|pair| pair[0].index() >= pair[1].index()) {
            return Err(AppError::InvalidInput(
                "synthesis results are not in index order".to_string(),
            ));
        }

        let last = results.len() - 1;
        let mut track: Vec<f32> = Vec::new();
        let mut segments = Vec::with_capacity(results.len());
        let mut current_time = 0.0_f64;

        for (position, result) in results.into_iter().enumerate() {
            let duration = round_millis(result.duration());
            let start_time = current_time;
            let end_time = round_millis(start_time + duration);

            let segment = match result {
                SynthesisResult::Success { index, text, audio, .. } => {
                    track.extend(self.prepare_clip(audio, duration)?);
                    TimingSegment {
                        index,
                        text,
                        start_time,
                        end_time,
                        duration,
                        status: SegmentStatus::Success,
                        error: None,
                    }
                }
                SynthesisResult::Failure { index, text, error, .. } => {
                    warn!("Segment {} replaced with {:.3}s of silence: {}", index, duration, error);
                    track.extend(silence(duration, self.sample_rate));
                    TimingSegment {
                        index,
                        text,
                        start_time,
                        end_time,
                        duration,
                        status: SegmentStatus::Error,
                        error: Some(error),
                    }
                }
            };
            segments.push(segment);
            current_time = end_time;

            if position != last {
                track.extend(silence(INTER_SEGMENT_SILENCE, self.sample_rate));
                current_time = round_millis(current_time + INTER_SEGMENT_SILENCE);
            }
        }

        Ok(AssembledTrack {
            samples: track,
            sample_rate: self.sample_rate,
            segments,
            total_duration: current_time,
        })
    }

    /// Склеивает дорожку, пишет WAV и журнал. Оба файла пишутся один раз и дальше только читаются.
    pub fn assemble(
        &self,
        results: Vec<SynthesisResult>,
        language: &str,
        audio_path: &Path,
        ledger_path: &Path,
    ) -> AppResult<TimingLedger> {
        let track = self.assemble_in_memory(results)?;
        encode_wav(&track.samples, track.sample_rate, audio_path)?;

        let ledger = TimingLedger::new(
            language,
            audio_path.to_path_buf(),
            track.segments,
            track.total_duration,
        );
        ledger.save(ledger_path)?;

        info!(
            "Assembled {} track: {} segments, {:.3}s -> {}",
            language,
            ledger.total_segments,
            ledger.total_duration,
            audio_path.display()
        );
        Ok(ledger)
    }

    // Клип приводится к частоте дорожки и ровно к длине, записанной в журнал
    fn prepare_clip(&self, audio: SegmentAudio, duration: f64) -> AppResult<Vec<f32>> {
        let clip = if audio.sample_rate == self.sample_rate {
            audio.samples
        } else {
            resample(&audio.samples, audio.sample_rate, self.sample_rate)?
        };
        Ok(fit_to_length(clip, samples_for_duration(duration, self.sample_rate)))
    }
}
