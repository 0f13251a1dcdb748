use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::info;
use tokio::sync::mpsc;

use narration_sync::config::{AppConfig, RealignStrategy};
use narration_sync::models::TimingLedger;
use narration_sync::services::audio::{AudioFileProbe, FfprobeProbe, MediaProbe};
use narration_sync::services::realign::RealignmentEngine;
use narration_sync::services::transcription::WhisperRecognizer;
use narration_sync::services::validation::validate_synchronization;
use narration_sync::services::video::plan_reconciliation;
use narration_sync::utils::logger::init_logger;
use narration_sync::NarrationPipeline;

/// Sentence-timed narration and subtitle synchronization
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize narration, timing ledger and subtitles for each language
    Narrate {
        /// Text per language as LANG=FILE, may be repeated
        #[arg(short, long = "text", value_parser = parse_language_text, required = true)]
        texts: Vec<(String, PathBuf)>,
        /// Output directory (overrides configuration)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Realign each produced subtitle file against its track
        #[arg(long)]
        realign: bool,
    },
    /// Check a timing ledger against its audio track
    Validate {
        /// Timing ledger JSON
        ledger: PathBuf,
    },
    /// Realign an SRT file to an audio track, writing `{stem}_synced.srt`
    Realign {
        /// Subtitle file
        subtitles: PathBuf,
        /// Audio track
        audio: PathBuf,
        /// Strategy: auto, offset, adaptive_warp, forced_alignment, proportional, energy
        #[arg(short, long)]
        strategy: Option<RealignStrategy>,
        /// Language hint for speech recognition
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Plan how a video should be looped or trimmed to match an audio track
    Reconcile {
        video: PathBuf,
        audio: PathBuf,
    },
}

fn parse_language_text(value: &str) -> Result<(String, PathBuf), String> {
    let (language, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected LANG=FILE, got '{}'", value))?;
    if language.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected LANG=FILE, got '{}'", value));
    }
    Ok((language.trim().to_string(), PathBuf::from(path.trim())))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_engine(
    config: &AppConfig,
    strategy: Option<RealignStrategy>,
) -> anyhow::Result<RealignmentEngine> {
    let mut realign_config = config.realign.clone();
    if let Some(strategy) = strategy {
        realign_config.strategy = strategy;
    }

    let engine = RealignmentEngine::new(realign_config, Box::new(AudioFileProbe));
    if config.recognition.api_key.is_some() {
        Ok(engine.with_recognizer(Box::new(WhisperRecognizer::new(&config.recognition)?)))
    } else {
        info!("OPENAI_API_KEY not set, realigning without speech recognition");
        Ok(engine)
    }
}

async fn narrate(
    mut config: AppConfig,
    texts: Vec<(String, PathBuf)>,
    output_dir: Option<PathBuf>,
    realign: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let mut inputs = Vec::with_capacity(texts.len());
    for (language, path) in texts {
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push((language, text));
    }

    let (sender, mut receiver) = mpsc::channel(64);
    let reporter = tokio::spawn(async move {
        while let Some(update) = receiver.recv().await {
            log::debug!("Progress: {:?}", update);
        }
    });

    let engine = if realign { Some(build_engine(&config, None)?) } else { None };
    let pipeline = NarrationPipeline::from_config(config)?.with_progress(sender);
    let results = pipeline.run_all(&inputs).await;

    let mut packages = Vec::new();
    let mut failures = Vec::new();
    for (language, result) in results {
        match result {
            Ok(mut package) => {
                if let Some(engine) = &engine {
                    if let Err(e) = pipeline.realign_package(&mut package, engine).await {
                        failures.push(format!("{} realignment: {}", language, e));
                    }
                }
                packages.push(package);
            }
            Err(e) => failures.push(format!("{}: {}", language, e)),
        }
    }
    drop(pipeline);
    reporter.await?;
    print_json(&packages)?;

    if !failures.is_empty() {
        return Err(anyhow!("Some languages failed: {}", failures.join("; ")));
    }
    Ok(())
}

async fn realign(
    config: AppConfig,
    subtitles: PathBuf,
    audio: PathBuf,
    strategy: Option<RealignStrategy>,
    language: Option<String>,
) -> anyhow::Result<()> {
    let engine = build_engine(&config, strategy)?;
    let outcome = engine
        .realign_file(&subtitles, &audio, language.as_deref())
        .await
        .with_context(|| format!("Failed to realign {}", subtitles.display()))?;
    print_json(&outcome)
}

fn reconcile(video: PathBuf, audio: PathBuf) -> anyhow::Result<()> {
    let ffprobe = FfprobeProbe::locate().ok_or_else(|| anyhow!("ffprobe not found in PATH"))?;
    let video_duration = ffprobe.duration(&video)?;
    let audio_duration = AudioFileProbe.duration(&audio)?;

    let plan = plan_reconciliation(video_duration, audio_duration)?;
    print_json(&serde_json::json!({
        "plan": plan,
        "video_filter": plan.video_filter(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Narrate { texts, output_dir, realign } => {
            narrate(config, texts, output_dir, realign).await
        }
        Commands::Validate { ledger } => {
            let ledger = TimingLedger::load(&ledger)
                .with_context(|| format!("Failed to load ledger {}", ledger.display()))?;
            let report = validate_synchronization(&ledger, &AudioFileProbe);
            print_json(&report)
        }
        Commands::Realign { subtitles, audio, strategy, language } => {
            realign(config, subtitles, audio, strategy, language).await
        }
        Commands::Reconcile { video, audio } => reconcile(video, audio),
    }
}
