//! Определение длительности медиафайлов.

use std::path::{Path, PathBuf};
use std::process::Command;

use hound::WavReader;
use log::debug;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::format::decode_audio_file;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Не удалось прочитать медиафайл: {0}")]
    UnreadableMedia(String),
}

/// Источник длительности медиафайла
pub trait MediaProbe: Send + Sync {
    fn duration(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Длительность аудиофайлов без внешних программ: WAV по заголовку,
/// остальное через Symphonia.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioFileProbe;

impl MediaProbe for AudioFileProbe {
    fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::UnreadableMedia(format!("{} does not exist", path.display())));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        if extension == "wav" {
            let reader = WavReader::open(path)
                .map_err(|e| ProbeError::UnreadableMedia(format!("{}: {}", path.display(), e)))?;
            let spec = reader.spec();
            if spec.sample_rate == 0 {
                return Err(ProbeError::UnreadableMedia(format!(
                    "{}: zero sample rate",
                    path.display()
                )));
            }
            // duration() у hound возвращает количество кадров
            return Ok(reader.duration() as f64 / spec.sample_rate as f64);
        }

        if let Some(seconds) = container_duration(path, &extension) {
            return Ok(seconds);
        }

        // Контейнер не знает числа кадров, считаем декодированием
        let (samples, sample_rate) = decode_audio_file(path)
            .map_err(|e| ProbeError::UnreadableMedia(format!("{}: {}", path.display(), e)))?;
        Ok(samples.len() as f64 / sample_rate as f64)
    }
}

fn container_duration(path: &Path, extension: &str) -> Option<f64> {
    let file = std::fs::File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if !extension.is_empty() {
        hint.with_extension(extension);
    }
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;
    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)?;
    let frames = track.codec_params.n_frames?;
    let rate = track.codec_params.sample_rate?;
    Some(frames as f64 / rate as f64)
}

/// Длительность любого медиафайла (в том числе видео) через ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl FfprobeProbe {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Ищет ffprobe в PATH
    pub fn locate() -> Option<Self> {
        which::which("ffprobe").ok().map(Self::new)
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::UnreadableMedia(format!("{} does not exist", path.display())));
        }

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .output()
            .map_err(|e| ProbeError::UnreadableMedia(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::UnreadableMedia(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("ffprobe output for {}: {}", path.display(), stdout.trim());
        parse_ffprobe_duration(&stdout).ok_or_else(|| {
            ProbeError::UnreadableMedia(format!("no duration reported for {}", path.display()))
        })
    }
}

fn parse_ffprobe_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .find(|d| d.is_finite() && *d >= 0.0)
}
