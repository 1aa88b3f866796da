// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice message transcription with a fixed-window hourly quota.
//!
//! Exceeding the quota fails fast with a user-facing message; requests are
//! never queued.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use mordomo_config::model::ClassifierConfig;
use mordomo_core::{MordomoError, SpeechTranscriber};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// User-facing message sent when the transcription quota is exhausted.
pub const RATE_LIMIT_MESSAGE: &str =
    "Limite de transcrições de áudio atingido nesta hora. Envie a mensagem em texto \
     ou tente novamente mais tarde.";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

struct RateWindow {
    started_at: DateTime<Utc>,
    used: u32,
}

/// Speech transcription client with a per-hour fixed window limit.
pub struct SpeechClient {
    client: reqwest::Client,
    config: ClassifierConfig,
    window: Mutex<RateWindow>,
}

impl SpeechClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, MordomoError> {
        let client = crate::build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            window: Mutex::new(RateWindow {
                started_at: Utc::now(),
                used: 0,
            }),
        })
    }

    /// Consumes one quota slot or fails fast when the window is full.
    async fn take_slot(&self) -> Result<(), MordomoError> {
        let mut window = self.window.lock().await;
        let now = Utc::now();
        if now - window.started_at >= Duration::hours(1) {
            window.started_at = now;
            window.used = 0;
        }
        if window.used >= self.config.speech_hourly_limit {
            warn!(
                used = window.used,
                limit = self.config.speech_hourly_limit,
                "speech transcription quota exhausted"
            );
            return Err(MordomoError::RateLimited {
                message: RATE_LIMIT_MESSAGE.to_string(),
            });
        }
        window.used += 1;
        Ok(())
    }
}

#[async_trait]
impl SpeechTranscriber for SpeechClient {
    async fn transcribe(&self, audio: &[u8], mime: &str) -> Result<String, MordomoError> {
        self.take_slot().await?;

        let body = serde_json::json!({
            "model": "whisper-1",
            "mime": mime,
            "audio_b64": base64::engine::general_purpose::STANDARD.encode(audio),
        });

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.config.api_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| crate::map_transport_err(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MordomoError::Classifier {
                message: format!("speech service returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: TranscriptionResponse =
            response.json().await.map_err(|e| MordomoError::Classifier {
                message: format!("malformed transcription response: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(chars = parsed.text.len(), "voice message transcribed");
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_url: String, limit: u32) -> ClassifierConfig {
        ClassifierConfig {
            api_url,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
            speech_hourly_limit: limit,
        }
    }

    #[tokio::test]
    async fn transcribe_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "cheguei às oito e meia"})),
            )
            .mount(&server)
            .await;

        let speech = SpeechClient::new(make_config(server.uri(), 20)).unwrap();
        let text = speech.transcribe(b"fake-ogg", "audio/ogg").await.unwrap();
        assert_eq!(text, "cheguei às oito e meia");
    }

    #[tokio::test]
    async fn quota_exhaustion_fails_fast_without_calling_service() {
        // No mock mounted: a request past the limit would 404 and fail the
        // wrong way; the rate limit must trip before any HTTP call.
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "oi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let speech = SpeechClient::new(make_config(server.uri(), 1)).unwrap();
        speech.transcribe(b"a", "audio/ogg").await.unwrap();

        let err = speech.transcribe(b"b", "audio/ogg").await.unwrap_err();
        match err {
            MordomoError::RateLimited { message } => {
                assert_eq!(message, RATE_LIMIT_MESSAGE);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn service_error_is_classifier_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let speech = SpeechClient::new(make_config(server.uri(), 20)).unwrap();
        let err = speech.transcribe(b"a", "audio/ogg").await.unwrap_err();
        assert!(matches!(err, MordomoError::Classifier { .. }));
    }
}
