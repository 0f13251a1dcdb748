use std::time::Duration;

use log::{debug, warn};
use reqwest::{header, Client, StatusCode};

use super::{EncodedSpeech, SpeechBackend, SynthesisError};
use crate::config::SynthesisConfig;
use crate::errors::AppResult;
use crate::services::audio::AudioFormat;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Речь через публичный endpoint Google Translate (резервный бэкенд).
/// Endpoint принимает короткие фрагменты, поэтому текст режется на части.
pub struct GoogleTranslateBackend {
    client: Client,
    chunk_chars: usize,
}

impl GoogleTranslateBackend {
    pub fn new(config: &SynthesisConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            chunk_chars: config.fallback_chunk_chars.max(1),
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> Result<bytes::Bytes, SynthesisError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(ENDPOINT)
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SynthesisError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Google TTS returned {} for chunk {}", status, idx);
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    SynthesisError::QuotaExceeded(format!("HTTP {}", status))
                }
                StatusCode::BAD_REQUEST => SynthesisError::InvalidInput(format!(
                    "unsupported language or text (HTTP {})",
                    status
                )),
                _ => SynthesisError::BackendUnavailable(format!("HTTP {}", status)),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| SynthesisError::BackendUnavailable(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SpeechBackend for GoogleTranslateBackend {
    fn name(&self) -> &str {
        "google-translate"
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<EncodedSpeech, SynthesisError> {
        let chunks = chunk_text(text, self.chunk_chars);
        if chunks.is_empty() {
            return Err(SynthesisError::InvalidInput("empty text".to_string()));
        }

        debug!("Google TTS: {} chunk(s) for language {}", chunks.len(), language);
        let mut parts = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            parts.push(self.fetch_chunk(chunk, language, idx, chunks.len()).await?);
        }

        Ok(EncodedSpeech { parts, format: AudioFormat::Mp3 })
    }
}

/// Жадно режет текст по словам на части не длиннее `max_chars` символов.
/// Слово длиннее лимита режется посимвольно.
pub(crate) fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunk_text("Merhaba dünya.", 100), vec!["Merhaba dünya."]);
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = chunk_text(text, 12);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12), "{:?}", chunks);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_long_word_is_split() {
        let chunks = chunk_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("   ", 10).is_empty());
    }
}
