//! # Segment synthesizer
//!
//! Синтез одного предложения с автоматическим переходом на резервный бэкенд.
//! Ошибка одного предложения никогда не прерывает пакет: вместо нее
//! возвращается `SynthesisResult::Failure` с оценочной длительностью.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use tempfile::TempPath;

use super::{
    get_fallback_backend, get_primary_backend, EncodedSpeech, SpeechBackend, SynthesisError,
};
use crate::config::SynthesisConfig;
use crate::errors::AppResult;
use crate::models::{round_millis, SegmentAudio, SynthesisResult, TextSegment};
use crate::services::audio::format::{decode_audio_file, resample};

pub struct SegmentSynthesizer {
    primary: Option<Box<dyn SpeechBackend>>,
    fallback: Box<dyn SpeechBackend>,
    timeout: Duration,
    work_dir: Option<PathBuf>,
}

impl SegmentSynthesizer {
    pub fn new(
        primary: Option<Box<dyn SpeechBackend>>,
        fallback: Box<dyn SpeechBackend>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
            work_dir: None,
        }
    }

    /// Собирает синтезатор из конфигурации
    pub fn from_config(config: &SynthesisConfig) -> AppResult<Self> {
        let primary = get_primary_backend(config)?;
        let fallback = get_fallback_backend(config)?;
        info!(
            "Synthesizer ({} backend): primary={}, fallback={}",
            config.backend.as_str(),
            primary.as_ref().map(|b| b.name()).unwrap_or("none"),
            fallback.name()
        );
        Ok(Self::new(primary, fallback, Duration::from_secs(config.request_timeout_secs)))
    }

    /// Каталог для временных файлов сегментов (по умолчанию системный temp)
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    /// Синтезирует одно предложение: основной бэкенд, затем ровно одна попытка резервного.
    pub async fn synthesize_segment(
        &self,
        segment: &TextSegment,
        language: &str,
    ) -> SynthesisResult {
        let mut errors = Vec::new();

        if let Some(primary) = &self.primary {
            match self.attempt(primary.as_ref(), segment, language).await {
                Ok(result) => return result,
                Err(e) => {
                    warn!(
                        "Segment {} failed on {}: {}, switching to fallback",
                        segment.index,
                        primary.name(),
                        e
                    );
                    errors.push(format!("{}: {}", primary.name(), e));
                }
            }
        }

        match self.attempt(self.fallback.as_ref(), segment, language).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Segment {} failed on {}: {}", segment.index, self.fallback.name(), e);
                errors.push(format!("{}: {}", self.fallback.name(), e));
                SynthesisResult::failure(segment, errors.join("; "))
            }
        }
    }

    async fn attempt(
        &self,
        backend: &dyn SpeechBackend,
        segment: &TextSegment,
        language: &str,
    ) -> Result<SynthesisResult, SynthesisError> {
        let timeout = self.timeout;
        let speech = tokio::time::timeout(timeout, backend.synthesize(&segment.text, language))
            .await
            .map_err(|_| {
                SynthesisError::BackendUnavailable(format!("timed out after {:?}", timeout))
            })??;

        let work_dir = self.work_dir.clone();
        let audio = tokio::task::spawn_blocking(move || Self::decode(work_dir.as_deref(), speech))
            .await
            .map_err(|e| {
                SynthesisError::BackendUnavailable(format!("decoding task failed: {}", e))
            })??;
        let frames = audio.samples.len();
        let duration = round_millis(frames as f64 / audio.sample_rate as f64);
        if duration <= 0.0 {
            return Err(SynthesisError::BackendUnavailable(
                "backend returned empty audio".to_string(),
            ));
        }

        debug!("Segment {} synthesized by {}: {:.3}s", segment.index, backend.name(), duration);
        Ok(SynthesisResult::Success {
            index: segment.index,
            text: segment.text.clone(),
            audio,
            duration,
        })
    }

    // Каждая часть пишется во временный файл и декодируется из него.
    // Файлы уезжают внутрь SegmentAudio; при ошибке удаляются сразу.
    fn decode(
        work_dir: Option<&Path>,
        speech: EncodedSpeech,
    ) -> Result<SegmentAudio, SynthesisError> {
        let mut artifacts: Vec<TempPath> = Vec::with_capacity(speech.parts.len());
        let mut samples: Vec<f32> = Vec::new();
        let mut sample_rate: Option<u32> = None;

        for part in &speech.parts {
            let path = Self::write_artifact(work_dir, part, speech.format.extension())?;
            let (part_samples, part_rate) = decode_audio_file(&path).map_err(|e| {
                SynthesisError::BackendUnavailable(format!("undecodable audio: {}", e))
            })?;
            artifacts.push(path);

            match sample_rate {
                None => {
                    sample_rate = Some(part_rate);
                    samples.extend(part_samples);
                }
                Some(rate) if rate == part_rate => samples.extend(part_samples),
                Some(rate) => {
                    let converted = resample(&part_samples, part_rate, rate)
                        .map_err(|e| SynthesisError::BackendUnavailable(e.to_string()))?;
                    samples.extend(converted);
                }
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| {
            SynthesisError::BackendUnavailable("backend returned no audio".to_string())
        })?;
        Ok(SegmentAudio::new(samples, sample_rate).with_artifacts(artifacts))
    }

    fn write_artifact(
        work_dir: Option<&Path>,
        data: &[u8],
        extension: &str,
    ) -> Result<TempPath, SynthesisError> {
        let suffix = format!(".{}", extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix("segment_").suffix(&suffix);
        let file = match work_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };

        let mut file =
            file.map_err(|e| SynthesisError::BackendUnavailable(format!("temp file: {}", e)))?;
        file.write_all(data)
            .and_then(|_| file.flush())
            .map_err(|e| SynthesisError::BackendUnavailable(format!("temp file: {}", e)))?;
        Ok(file.into_temp_path())
    }
}
