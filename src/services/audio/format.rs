//! # Audio Format Handling
//!
//! Декодирование ответов TTS и готовых дорожек в моно PCM (f32),
//! запись WAV, передискретизация и выравнивание длины клипов.
//!
//! ## Основные возможности
//!
//! - Декодирование MP3 через Symphonia и WAV через hound
//! - Микширование многоканального аудио в моно
//! - Передискретизация через rubato
//! - Кодирование PCM данных в WAV (32-bit float)

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::{AppError, AppResult};

/// Размер блока для передискретизации
const RESAMPLE_CHUNK: usize = 1024;

/// Формат закодированного аудио, которое возвращает бэкенд синтеза
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// Количество семплов для заданной длительности
pub fn samples_for_duration(duration: f64, sample_rate: u32) -> usize {
    (duration.max(0.0) * sample_rate as f64).round() as usize
}

/// Тишина заданной длительности
pub fn silence(duration: f64, sample_rate: u32) -> Vec<f32> {
    vec![0.0; samples_for_duration(duration, sample_rate)]
}

/// Обрезает или дополняет тишиной до точного количества семплов
pub fn fit_to_length(mut samples: Vec<f32>, length: usize) -> Vec<f32> {
    samples.resize(length, 0.0);
    samples
}

/// Декодирует аудиофайл, формат определяется по расширению.
pub fn decode_audio_file(path: &Path) -> AppResult<(Vec<f32>, u32)> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !path.exists() {
        return Err(AppError::MissingInputFile(path.display().to_string()));
    }

    match extension.as_str() {
        "wav" => decode_wav(std::fs::File::open(path)?),
        _ => {
            let file = std::fs::File::open(path)?;
            let hint = if extension.is_empty() { None } else { Some(extension.as_str()) };
            decode_with_symphonia(Box::new(file), hint)
        }
    }
}

fn decode_wav<R: Read>(reader: R) -> AppResult<(Vec<f32>, u32)> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, hound::Error>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<f32>, hound::Error>>()?
        }
    };

    let mono = if channels > 1 {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        interleaved
    };

    debug!("Decoded {} WAV frames at {} Hz", mono.len(), spec.sample_rate);
    Ok((mono, spec.sample_rate))
}

fn decode_with_symphonia(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
) -> AppResult<(Vec<f32>, u32)> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            AppError::AudioProcessingError(format!("Не удалось определить формат аудио: {}", e))
        })?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AppError::AudioProcessingError("Не найден аудио-трек".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AppError::AudioProcessingError(format!("Не удалось создать декодер: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut pcm_data = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AppError::AudioProcessingError(format!("Ошибка чтения пакета: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                let channels = spec.channels.count().max(1);

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_planar_ref(decoded);
                let samples = sample_buf.samples();

                // Планарная раскладка: сначала все семплы первого канала, затем второго
                if channels > 1 {
                    let frames = samples.len() / channels;
                    for frame in 0..frames {
                        let sum: f32 = (0..channels).map(|ch| samples[ch * frames + frame]).sum();
                        pcm_data.push(sum / channels as f32);
                    }
                } else {
                    pcm_data.extend_from_slice(samples);
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Ошибка декодирования пакета: {}", e);
                continue;
            }
            Err(e) => {
                return Err(AppError::AudioProcessingError(format!("Ошибка декодирования: {}", e)));
            }
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        AppError::AudioProcessingError("Неизвестная частота дискретизации".to_string())
    })?;
    debug!("Decoded {} frames at {} Hz", pcm_data.len(), sample_rate);
    Ok((pcm_data, sample_rate))
}

/// Записывает моно PCM в WAV (32-bit float).
pub fn encode_wav(samples: &[f32], sample_rate: u32, path: &Path) -> AppResult<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Кодирует моно PCM в WAV 16-bit в памяти (компактный вариант для загрузки в API)
pub fn encode_wav_pcm16(samples: &[f32], sample_rate: u32) -> AppResult<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Передискретизирует моно сигнал. Длина результата: `len * to / from` с округлением.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> AppResult<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(AppError::AudioProcessingError("Нулевая частота дискретизации".to_string()));
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| AppError::AudioProcessingError(format!("Ошибка создания ресемплера: {}", e)))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        let input = vec![chunk.to_vec()];
        let processed = (if chunk.len() == RESAMPLE_CHUNK {
            resampler.process(&input[..], None)
        } else {
            resampler.process_partial(Some(&input[..]), None)
        })
        .map_err(|e| AppError::AudioProcessingError(format!("Ошибка передискретизации: {}", e)))?;
        output.extend_from_slice(&processed[0]);
    }

    // Досчитываем хвост, задержанный фильтром
    while output.len() < expected + delay {
        let processed = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| {
                AppError::AudioProcessingError(format!("Ошибка передискретизации: {}", e))
            })?;
        if processed[0].is_empty() {
            break;
        }
        output.extend_from_slice(&processed[0]);
    }

    let mut resampled: Vec<f32> = output.into_iter().skip(delay).collect();
    resampled.truncate(expected);
    Ok(resampled)
}
