// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable classifier, speech, vision, and alert sink mocks.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mordomo_core::types::{AlertEvent, ClassifiedIntent, ClassifyRequest, ExtractedFields};
use mordomo_core::{
    AlertSink, IntentClassifier, MordomoError, SpeechTranscriber, VisionExtractor,
};

/// Classifier returning scripted results in order; defaults to no intent
/// when the script runs out.
pub struct MockClassifier {
    script: Mutex<VecDeque<Result<ClassifiedIntent, MordomoError>>>,
    requests: Mutex<Vec<ClassifyRequest>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next classification result.
    pub async fn push_intent(&self, intent: ClassifiedIntent) {
        self.script.lock().await.push_back(Ok(intent));
    }

    /// Queue a transport failure.
    pub async fn push_error(&self, error: MordomoError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Requests observed so far, in order.
    pub async fn requests(&self) -> Vec<ClassifyRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentClassifier for MockClassifier {
    async fn classify(&self, req: &ClassifyRequest) -> Result<ClassifiedIntent, MordomoError> {
        self.requests.lock().await.push(req.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ClassifiedIntent::none()))
    }
}

/// Speech transcriber returning scripted transcripts; defaults to an empty
/// transcript.
pub struct MockSpeech {
    script: Mutex<VecDeque<Result<String, MordomoError>>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push_transcript(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text.to_string()));
    }

    pub async fn push_error(&self, error: MordomoError) {
        self.script.lock().await.push_back(Err(error));
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechTranscriber for MockSpeech {
    async fn transcribe(&self, _audio: &[u8], _mime: &str) -> Result<String, MordomoError> {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Vision extractor returning scripted fields; defaults to empty fields.
pub struct MockVision {
    script: Mutex<VecDeque<Result<ExtractedFields, MordomoError>>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push_fields(&self, fields: ExtractedFields) {
        self.script.lock().await.push_back(Ok(fields));
    }
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionExtractor for MockVision {
    async fn extract(&self, _image: &[u8], _mime: &str) -> Result<ExtractedFields, MordomoError> {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ExtractedFields::default()))
    }
}

/// Alert sink capturing events for assertions.
pub struct MockAlertSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl MockAlertSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub async fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().await.clone()
    }
}

impl Default for MockAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for MockAlertSink {
    async fn notify(&self, event: AlertEvent) {
        self.events.lock().await.push(event);
    }
}
