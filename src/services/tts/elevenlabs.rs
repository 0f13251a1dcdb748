use std::time::Duration;

use bytes::Bytes;
use log::{debug, error, info};
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};

use super::{EncodedSpeech, SpeechBackend, SynthesisError};
use crate::config::SynthesisConfig;
use crate::errors::{AppError, AppResult};
use crate::services::audio::AudioFormat;

const API_BASE: &str = "https://api.elevenlabs.io/v1";

/// MP3 44.1 кГц, 128 кбит/с
pub const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Клиент ElevenLabs text-to-speech API (основной бэкенд)
pub struct ElevenLabsBackend {
    client: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsBackend {
    pub fn new(config: &SynthesisConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigurationError("ElevenLabs API key is not set".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SpeechBackend for ElevenLabsBackend {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<EncodedSpeech, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("empty text".to_string()));
        }

        // Мультиязычная модель определяет язык по тексту сама
        debug!("ElevenLabs request ({} chars, language hint {})", text.chars().count(), language);

        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", API_BASE, self.voice_id))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.api_key)
            .header(header::ACCEPT, "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": self.model_id,
            }))
            .send()
            .await
            .map_err(|e| SynthesisError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = classify_failure(status, &body);
            error!("Ошибка API ElevenLabs (статус {}): {}", status, failure);
            return Err(failure);
        }

        let audio: Bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::BackendUnavailable(e.to_string()))?;
        info!("Получен аудио-ответ ElevenLabs: {} байт", audio.len());

        Ok(EncodedSpeech::single(audio, AudioFormat::Mp3))
    }
}

/// Сопоставляет ответ API с видом ошибки синтеза.
///
/// Исчерпанная квота приходит как 401 со статусом `quota_exceeded` в теле.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> SynthesisError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let detail_status = parsed["detail"]["status"].as_str().unwrap_or_default();
    let message = parsed["detail"]["message"]
        .as_str()
        .or_else(|| parsed["detail"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    if detail_status.contains("quota") || status == StatusCode::TOO_MANY_REQUESTS {
        return SynthesisError::QuotaExceeded(message);
    }

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            SynthesisError::InvalidInput(message)
        }
        _ => SynthesisError::BackendUnavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detected_from_body() {
        let body = r#"{"detail":{"status":"quota_exceeded",
            "message":"This request exceeds your quota."}}"#;
        let failure = classify_failure(StatusCode::UNAUTHORIZED, body);
        let message = "This request exceeds your quota.".to_string();
        assert_eq!(failure, SynthesisError::QuotaExceeded(message));
    }

    #[test]
    fn test_rate_limit_is_quota() {
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            SynthesisError::QuotaExceeded(_)
        ));
    }

    #[test]
    fn test_validation_errors_are_invalid_input() {
        let body = r#"{"detail":"text too long"}"#;
        assert_eq!(
            classify_failure(StatusCode::UNPROCESSABLE_ENTITY, body),
            SynthesisError::InvalidInput("text too long".to_string())
        );
    }

    #[test]
    fn test_server_errors_are_unavailable() {
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, "<html>"),
            SynthesisError::BackendUnavailable(_)
        ));
    }

    #[test]
    fn test_missing_key_rejected() {
        let config = SynthesisConfig::default();
        assert!(ElevenLabsBackend::new(&config).is_err());
    }
}
