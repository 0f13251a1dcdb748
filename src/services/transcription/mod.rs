//! # Speech recognition
//!
//! Распознавание речи с временными метками через OpenAI Whisper.
//! Используется только для пересинхронизации субтитров и не повторяется
//! при ошибке: неудача означает "нет сигнала для коррекции".

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RecognitionConfig;
use crate::errors::{AppError, AppResult};
use crate::services::audio::format::{decode_audio_file, encode_wav_pcm16, resample};

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Частота, до которой понижается аудио перед загрузкой
const UPLOAD_SAMPLE_RATE: u32 = 16_000;

/// Лимит размера файла в API
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Распознавание речи не удалось: {0}")]
    RecognitionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Результат распознавания. `words` пуст, если пословные метки не запрашивались.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(default)]
    pub segments: Vec<RecognizedSegment>,
    #[serde(default)]
    pub words: Vec<RecognizedWord>,
}

impl Recognition {
    pub fn first_speech_start(&self) -> Option<f64> {
        self.segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| s.start)
            .next()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.words.is_empty()
    }
}

/// Trait for speech recognition collaborators
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(
        &self,
        audio_path: &Path,
        language_hint: Option<&str>,
        with_words: bool,
    ) -> Result<Recognition, RecognitionError>;
}

/// Клиент OpenAI Whisper (`verbose_json` с метками сегментов и слов)
pub struct WhisperRecognizer {
    client: Client,
    api_key: String,
    model: String,
}

impl WhisperRecognizer {
    pub fn new(config: &RecognitionConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::ConfigurationError("OpenAI API key is not set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
        })
    }
}

// Понижаем частоту и разрядность, чтобы длинные дорожки укладывались в лимит API
fn prepare_upload(audio_path: &Path) -> AppResult<Vec<u8>> {
    let (samples, sample_rate) = decode_audio_file(audio_path)?;
    let samples = resample(&samples, sample_rate, UPLOAD_SAMPLE_RATE)?;
    encode_wav_pcm16(&samples, UPLOAD_SAMPLE_RATE)
}

#[async_trait::async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn recognize(
        &self,
        audio_path: &Path,
        language_hint: Option<&str>,
        with_words: bool,
    ) -> Result<Recognition, RecognitionError> {
        let path = audio_path.to_path_buf();
        let upload = tokio::task::spawn_blocking(move || prepare_upload(&path))
            .await
            .map_err(|e| RecognitionError::RecognitionFailed(e.to_string()))?
            .map_err(|e| RecognitionError::RecognitionFailed(e.to_string()))?;

        if upload.len() > MAX_UPLOAD_BYTES {
            warn!("Upload of {} bytes exceeds the API limit", upload.len());
            return Err(RecognitionError::RecognitionFailed(format!(
                "audio too large for recognition: {} bytes",
                upload.len()
            )));
        }

        let file_part = Part::bytes(upload)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionError::RecognitionFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");
        if with_words {
            form = form.text("timestamp_granularities[]", "word");
        }
        if let Some(language) = language_hint {
            form = form.text("language", language.to_string());
        }

        info!("Requesting transcription for {} (words: {})", audio_path.display(), with_words);
        let response = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::RecognitionFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::RecognitionFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(RecognitionError::RecognitionFailed(format!("HTTP {}: {}", status, body)));
        }

        let recognition = parse_verbose_json(&body)?;
        debug!(
            "Recognized {} segments and {} words",
            recognition.segments.len(),
            recognition.words.len()
        );
        Ok(recognition)
    }
}

/// Разбирает ответ `verbose_json`
pub fn parse_verbose_json(body: &str) -> Result<Recognition, RecognitionError> {
    let recognition: Recognition = serde_json::from_str(body)
        .map_err(|e| RecognitionError::RecognitionFailed(format!("bad response: {}", e)))?;
    Ok(Recognition {
        segments: recognition
            .segments
            .into_iter()
            .map(|s| RecognizedSegment { text: s.text.trim().to_string(), ..s })
            .collect(),
        words: recognition
            .words
            .into_iter()
            .map(|w| RecognizedWord { text: w.text.trim().to_string(), ..w })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbose_json() {
        let body = r#"{
            "task": "transcribe", "language": "english", "duration": 3.2, "text": "Hello world.",
            "segments": [
                {"id": 0, "start": 0.42, "end": 1.6, "text": " Hello world.", "tokens": [1, 2]}
            ],
            "words": [
                {"word": "Hello", "start": 0.42, "end": 0.9},
                {"word": "world.", "start": 0.95, "end": 1.6}
            ]
        }"#;
        let recognition = parse_verbose_json(body).unwrap();
        assert_eq!(recognition.segments.len(), 1);
        assert_eq!(recognition.segments[0].text, "Hello world.");
        assert_eq!(recognition.first_speech_start(), Some(0.42));
        assert_eq!(recognition.words[1].text, "world.");
        assert_eq!(recognition.words[1].end, 1.6);
    }

    #[test]
    fn test_parse_without_words() {
        let recognition = parse_verbose_json(r#"{"text": "", "segments": []}"#).unwrap();
        assert!(recognition.is_empty());
        assert_eq!(recognition.first_speech_start(), None);
    }

    #[test]
    fn test_bad_response() {
        assert!(parse_verbose_json("<html>").is_err());
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(WhisperRecognizer::new(&RecognitionConfig::default()).is_err());
    }
}
