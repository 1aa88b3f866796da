// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound
//! messages, captured outbound messages, scriptable connect failures, and a
//! triggerable disconnect for supervisor tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use mordomo_core::traits::{ChannelAdapter, PluginAdapter};
use mordomo_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MediaRef, MessageId,
    OutboundMessage,
};
use mordomo_core::MordomoError;

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured and retrievable via `sent_messages()`
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundMessage>>,
    sent: Mutex<Vec<OutboundMessage>>,
    notify: Notify,
    connected: AtomicBool,
    closed: AtomicBool,
    connect_attempts: AtomicU32,
    fail_connects_remaining: AtomicU32,
    media: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            notify: Notify::new(),
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            connect_attempts: AtomicU32::new(0),
            fail_connects_remaining: AtomicU32::new(0),
            media: Mutex::new(HashMap::new()),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        // notify_one stores a permit, so a receive() racing this call still
        // wakes up.
        self.notify.notify_one();
    }

    /// Register bytes served by `download_media` for a media id.
    pub async fn stage_media(&self, media_id: &str, bytes: Vec<u8>) {
        self.media.lock().await.insert(media_id.to_string(), bytes);
    }

    /// All messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.fail_connects_remaining.store(n, Ordering::SeqCst);
    }

    /// Number of connect attempts observed so far.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Simulate a channel-level failure: `receive()` starts erroring until
    /// the next successful `connect()`.
    pub fn trigger_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MordomoError> {
        if self.is_connected() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("not connected".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), MordomoError> {
        self.trigger_disconnect();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            supports_voice: true,
            supports_documents: true,
            max_message_length: None,
        }
    }

    async fn connect(&self) -> Result<(), MordomoError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_connects_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_connects_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(MordomoError::Channel {
                message: "scripted connect failure".to_string(),
                source: None,
            });
        }

        self.closed.store(false, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, MordomoError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, MordomoError> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(MordomoError::Channel {
                    message: "mock channel closed".to_string(),
                    source: None,
                });
            }
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, MordomoError> {
        self.media
            .lock()
            .await
            .get(&media.id)
            .cloned()
            .ok_or_else(|| MordomoError::Channel {
                message: format!("no staged media for id {}", media.id),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::make_text_message;

    #[tokio::test]
    async fn receive_returns_injected_messages_in_order() {
        let channel = MockChannel::new();
        channel.inject_message(make_text_message("m1", "chat", "first")).await;
        channel.inject_message(make_text_message("m2", "chat", "second")).await;

        assert_eq!(channel.receive().await.unwrap().text, "first");
        assert_eq!(channel.receive().await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        channel
            .send(OutboundMessage {
                chat_id: "chat".to_string(),
                text: "resposta".to_string(),
                reply_to: None,
            })
            .await
            .unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "resposta");
    }

    #[tokio::test]
    async fn scripted_connect_failures_then_success() {
        let channel = MockChannel::new();
        channel.fail_next_connects(2);

        assert!(channel.connect().await.is_err());
        assert!(channel.connect().await.is_err());
        assert!(channel.connect().await.is_ok());
        assert_eq!(channel.connect_attempts(), 3);
        assert!(channel.is_connected());
    }

    #[tokio::test]
    async fn disconnect_makes_receive_error_until_reconnect() {
        let channel = MockChannel::new();
        channel.connect().await.unwrap();
        channel.trigger_disconnect();

        assert!(channel.receive().await.is_err());
        channel.connect().await.unwrap();
        channel.inject_message(make_text_message("m1", "chat", "oi")).await;
        assert!(channel.receive().await.is_ok());
    }

    #[tokio::test]
    async fn staged_media_round_trips() {
        let channel = MockChannel::new();
        channel.stage_media("media-1", vec![1, 2, 3]).await;

        let media = MediaRef {
            kind: mordomo_core::types::MediaKind::Audio,
            id: "media-1".to_string(),
            mime: "audio/ogg".to_string(),
        };
        assert_eq!(channel.download_media(&media).await.unwrap(), vec![1, 2, 3]);
    }
}
