// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator alert sink routed through the chat channel.

use std::sync::Arc;

use async_trait::async_trait;
use mordomo_core::types::{AlertEvent, OutboundMessage};
use mordomo_core::{AlertSink, ChannelAdapter};
use tracing::warn;

/// Sends operational alerts to the configured admin chat.
///
/// Delivery is spawned so alerting never blocks message processing; with no
/// admin chat configured, events are only logged.
pub struct ChannelAlertSink {
    channel: Arc<dyn ChannelAdapter>,
    admin_chat_id: Option<String>,
}

impl ChannelAlertSink {
    pub fn new(channel: Arc<dyn ChannelAdapter>, admin_chat_id: Option<String>) -> Self {
        Self {
            channel,
            admin_chat_id,
        }
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn notify(&self, event: AlertEvent) {
        warn!(event = %event, "operational alert");

        let Some(chat_id) = self.admin_chat_id.clone() else {
            return;
        };

        let channel = Arc::clone(&self.channel);
        let out = OutboundMessage {
            chat_id,
            text: format!("[mordomo] {event}"),
            reply_to: None,
        };
        tokio::spawn(async move {
            if let Err(e) = channel.send(out).await {
                warn!(error = %e, "failed to deliver operator alert");
            }
        });
    }
}
