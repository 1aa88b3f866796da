// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits for the external AI classification, speech, and vision services.

use async_trait::async_trait;

use crate::error::MordomoError;
use crate::types::{ClassifiedIntent, ClassifyRequest, ExtractedFields};

/// Classifies a message's intent via the external AI service.
///
/// Implementations must be pure request/response: no domain state is read or
/// written. Malformed service output is degraded to a no-intent result, never
/// surfaced as an error; only transport and service failures are `Err`.
#[async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifiedIntent, MordomoError>;
}

/// Transcribes voice messages to text.
///
/// Implementations enforce their quota and fail fast with
/// [`MordomoError::RateLimited`] when it is exhausted.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync + 'static {
    async fn transcribe(&self, audio: &[u8], mime: &str) -> Result<String, MordomoError>;
}

/// Extracts structured fields from document and invoice images.
#[async_trait]
pub trait VisionExtractor: Send + Sync + 'static {
    async fn extract(&self, image: &[u8], mime: &str) -> Result<ExtractedFields, MordomoError>;
}
