// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured field extraction from document and invoice images.

use async_trait::async_trait;
use base64::Engine;
use mordomo_config::model::ClassifierConfig;
use mordomo_core::types::ExtractedFields;
use mordomo_core::{MordomoError, VisionExtractor};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    fields: Option<ExtractedFields>,
}

/// Vision extraction client.
pub struct VisionClient {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl VisionClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, MordomoError> {
        let client = crate::build_http_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VisionExtractor for VisionClient {
    async fn extract(&self, image: &[u8], mime: &str) -> Result<ExtractedFields, MordomoError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "mime": mime,
            "image_b64": base64::engine::general_purpose::STANDARD.encode(image),
        });

        let response = self
            .client
            .post(format!("{}/vision/extractions", self.config.api_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| crate::map_transport_err(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MordomoError::Classifier {
                message: format!("vision service returned {status}: {body}"),
                source: None,
            });
        }

        let raw = response.text().await.map_err(|e| MordomoError::Classifier {
            message: format!("failed to read vision response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        // Accept either the documented envelope or bare fields; anything
        // else degrades to an empty extraction rather than failing the
        // message pipeline.
        let fields = match serde_json::from_str::<ExtractionResponse>(&raw) {
            Ok(ExtractionResponse { fields: Some(f) }) => f,
            Ok(ExtractionResponse { fields: None }) => {
                serde_json::from_str::<ExtractedFields>(&raw).unwrap_or_else(|_| {
                    warn!("vision response carried no fields, using empty extraction");
                    ExtractedFields::default()
                })
            }
            Err(_) => {
                warn!("vision response malformed, using empty extraction");
                ExtractedFields::default()
            }
        };

        debug!(
            has_number = fields.document_number.is_some(),
            has_vendor = fields.vendor.is_some(),
            items = fields.items.len(),
            "image extraction complete"
        );
        Ok(fields)
    }
}
