//! # Narration pipeline
//!
//! Полный проход для одного языка: нормализация и разбиение текста,
//! синтез предложений с ограниченным параллелизмом, сборка дорожки
//! и журнала, субтитры и проверка синхронизации. Языки независимы
//! и выполняются параллельно.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::models::SynchronizationReport;
use crate::services::assembler::TrackAssembler;
use crate::services::audio::{AudioFileProbe, MediaProbe};
use crate::services::realign::{RealignmentEngine, RealignmentOutcome};
use crate::services::subtitles::write_subtitles;
use crate::services::text::prepare_segments;
use crate::services::tts::synthesizer::SegmentSynthesizer;
use crate::services::validation::validate_synchronization;
use crate::services::video::{plan_reconciliation, ReconciliationPlan};

/// Обновления о ходе обработки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressUpdate {
    /// Начало обработки языка
    Started { language: String, segments: usize },
    /// Готово очередное предложение
    Segment { language: String, index: usize, total: usize },
    /// Дорожка и журнал записаны
    Assembled { language: String, duration: f64 },
    /// Отчет о синхронизации готов
    Validated { language: String, acceptable: bool },
    /// Язык обработан
    Finished { language: String },
    /// Ошибка обработки языка
    Error { language: String, message: String },
}

/// Отправляет обновление, если кто-то слушает. Закрытый канал не ошибка.
pub async fn send_progress(sender: &Option<Sender<ProgressUpdate>>, update: ProgressUpdate) {
    if let Some(sender) = sender {
        if sender.send(update).await.is_err() {
            log::debug!("Progress receiver dropped");
        }
    }
}

/// Результат обработки одного языка
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagePackage {
    pub language: String,
    pub audio_file: PathBuf,
    pub ledger_file: PathBuf,
    pub subtitle_file: PathBuf,
    pub subtitle_count: usize,
    pub report: SynchronizationReport,
}

pub struct NarrationPipeline {
    config: AppConfig,
    synthesizer: SegmentSynthesizer,
    assembler: TrackAssembler,
    probe: Box<dyn MediaProbe>,
    progress: Option<Sender<ProgressUpdate>>,
}

impl NarrationPipeline {
    pub fn new(
        config: AppConfig,
        synthesizer: SegmentSynthesizer,
        probe: Box<dyn MediaProbe>,
    ) -> Self {
        let assembler = TrackAssembler::new(config.track_sample_rate);
        Self {
            config,
            synthesizer,
            assembler,
            probe,
            progress: None,
        }
    }

    /// Пайплайн с бэкендами из конфигурации и пробой аудиофайлов
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let synthesizer = SegmentSynthesizer::from_config(&config.synthesis)?;
        Ok(Self::new(config, synthesizer, Box::new(AudioFileProbe)))
    }

    pub fn with_progress(mut self, sender: Sender<ProgressUpdate>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn output_path(&self, file_name: String) -> PathBuf {
        self.config.output_dir.join(file_name)
    }

    /// Обрабатывает один язык. Ошибки отдельных предложений не прерывают обработку;
    /// фатальны только пустой текст и ошибки записи файлов.
    pub async fn run_language(&self, language: &str, text: &str) -> AppResult<LanguagePackage> {
        let segments = prepare_segments(text)?;
        let total = segments.len();
        info!("Processing {}: {} sentences", language, total);
        send_progress(
            &self.progress,
            ProgressUpdate::Started { language: language.to_string(), segments: total },
        )
        .await;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let limit = self.config.synthesis.max_concurrent_segments.max(1);
        let syntheses: Vec<_> = segments
            .iter()
            .map(|segment| self.synthesizer.synthesize_segment(segment, language))
            .collect();
        let mut pending = stream::iter(syntheses).buffered(limit);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = pending.next().await {
            if !result.is_success() {
                warn!("{}: sentence {} will be silence", language, result.index());
            }
            send_progress(
                &self.progress,
                ProgressUpdate::Segment {
                    language: language.to_string(),
                    index: result.index(),
                    total,
                },
            )
            .await;
            results.push(result);
        }

        let base = &self.config.base_name;
        let audio_file = self.output_path(format!("{}_{}.wav", base, language));
        let ledger_file = self.output_path(format!("{}_{}_timing.json", base, language));
        let subtitle_file = self.output_path(format!("subtitle_{}.srt", language));

        let assembler = self.assembler;
        let (track_language, track_path, ledger_path) =
            (language.to_string(), audio_file.clone(), ledger_file.clone());
        let ledger = tokio::task::spawn_blocking(move || {
            assembler.assemble(results, &track_language, &track_path, &ledger_path)
        })
        .await??;
        send_progress(
            &self.progress,
            ProgressUpdate::Assembled {
                language: language.to_string(),
                duration: ledger.total_duration,
            },
        )
        .await;

        let subtitle_count = write_subtitles(&ledger, &subtitle_file)?;
        let report = validate_synchronization(&ledger, self.probe.as_ref());
        send_progress(
            &self.progress,
            ProgressUpdate::Validated {
                language: language.to_string(),
                acceptable: report.is_acceptable,
            },
        )
        .await;

        info!(
            "{} done: {}/{} sentences synthesized, {} cues",
            language, report.successful_segments, report.total_segments, subtitle_count
        );
        send_progress(
            &self.progress,
            ProgressUpdate::Finished { language: language.to_string() },
        )
        .await;

        Ok(LanguagePackage {
            language: language.to_string(),
            audio_file,
            ledger_file,
            subtitle_file,
            subtitle_count,
            report,
        })
    }

    /// Все языки параллельно. Ошибка одного языка не влияет на остальные.
    pub async fn run_all(
        &self,
        texts: &[(String, String)],
    ) -> Vec<(String, AppResult<LanguagePackage>)> {
        let runs = texts.iter().map(|(language, text)| async move {
            let result = self.run_language(language, text).await;
            if let Err(e) = &result {
                error!("{} failed: {}", language, e);
                send_progress(
                    &self.progress,
                    ProgressUpdate::Error { language: language.clone(), message: e.to_string() },
                )
                .await;
            }
            (language.clone(), result)
        });
        join_all(runs).await
    }

    /// Пересинхронизирует субтитры пакета с его дорожкой и отмечает итог в отчете.
    /// Исходный SRT остается на месте, результат пишется рядом.
    pub async fn realign_package(
        &self,
        package: &mut LanguagePackage,
        engine: &RealignmentEngine,
    ) -> AppResult<RealignmentOutcome> {
        let outcome = engine
            .realign_file(&package.subtitle_file, &package.audio_file, Some(&package.language))
            .await?;
        package.report = package.report.clone().with_correction(outcome.status.clone());
        Ok(outcome)
    }

    /// План согласования видео с готовой дорожкой
    pub fn reconcile_with_video(
        &self,
        video_path: &Path,
        package: &LanguagePackage,
        video_probe: &dyn MediaProbe,
    ) -> AppResult<ReconciliationPlan> {
        let video_duration = video_probe.duration(video_path)?;
        let audio_duration = self.probe.duration(&package.audio_file)?;
        plan_reconciliation(video_duration, audio_duration)
    }
}
