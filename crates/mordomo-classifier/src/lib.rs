// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External AI service adapters for the Mordomo household agent.
//!
//! [`AiClassifier`] implements the intent classification contract against a
//! chat-completions style HTTP endpoint. The adapter is pure request/response
//! and never mutates domain state. Malformed service output is degraded
//! through the layered parser in [`parse`]; only transport and service
//! failures surface as errors.

pub mod parse;
pub mod speech;
pub mod vision;

use std::time::Duration;

use async_trait::async_trait;
use mordomo_config::model::ClassifierConfig;
use mordomo_core::types::{ClassifiedIntent, ClassifyRequest};
use mordomo_core::{IntentClassifier, MordomoError};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

pub use speech::SpeechClient;
pub use vision::VisionClient;

/// Chat-completions response envelope.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Builds the shared HTTP client for the AI service adapters.
pub(crate) fn build_http_client(config: &ClassifierConfig) -> Result<reqwest::Client, MordomoError> {
    let mut headers = HeaderMap::new();
    if let Some(ref key) = config.api_key {
        let value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| MordomoError::Config(format!("invalid classifier api_key: {e}")))?;
        headers.insert("authorization", value);
    }
    headers.insert("content-type", HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| MordomoError::Classifier {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Maps a reqwest failure, distinguishing the timeout upper bound.
pub(crate) fn map_transport_err(e: reqwest::Error, timeout_secs: u64) -> MordomoError {
    if e.is_timeout() {
        MordomoError::Timeout {
            duration: Duration::from_secs(timeout_secs),
        }
    } else {
        MordomoError::Classifier {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

/// Intent classifier backed by the external AI service.
pub struct AiClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl AiClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, MordomoError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    fn system_prompt(req: &ClassifyRequest) -> String {
        let kinds = "entrada, saida, saida_almoco, retorno_almoco, document, delivery, \
                     invoice, receipt, suggestion, none";
        let mut prompt = format!(
            "You classify household staff chat messages. Respond with a single JSON \
             object: {{\"kind\": one of [{kinds}], \"confidence\": 0-100, \
             \"explicit_time\": \"HH:MM\" or null, \"extracted\": object or null}}.\n\
             Sender: {}.",
            req.sender_name
        );
        if !req.known_actors.is_empty() {
            prompt.push_str(&format!("\nKnown household staff: {}.", req.known_actors.join(", ")));
        }
        if let Some(kind) = req.media_kind {
            prompt.push_str(&format!("\nThe message carried {kind} media."));
        }
        if !req.context.is_empty() {
            prompt.push_str("\nRecent conversation:\n");
            for line in &req.context {
                prompt.push_str(line);
                prompt.push('\n');
            }
        }
        prompt
    }
}

#[async_trait]
impl IntentClassifier for AiClassifier {
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifiedIntent, MordomoError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": Self::system_prompt(req)},
                {"role": "user", "content": req.text},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_err(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MordomoError::Classifier {
                message: format!("classifier service returned {status}: {body}"),
                source: None,
            });
        }

        let raw = response.text().await.map_err(|e| MordomoError::Classifier {
            message: format!("failed to read classifier response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        // The envelope itself may be malformed; treat the whole body as
        // near-miss text in that case rather than erroring.
        let content = match serde_json::from_str::<ChatResponse>(&raw) {
            Ok(chat) => chat
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "classifier response envelope malformed, using raw body");
                raw
            }
        };

        let intent = parse::parse_intent(&content);
        debug!(
            kind = %intent.kind,
            confidence = intent.confidence,
            source = ?intent.source,
            "message classified"
        );
        Ok(intent)
    }
}
