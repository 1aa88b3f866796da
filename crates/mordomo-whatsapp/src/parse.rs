// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud webhook payload parsing.
//!
//! Walks the `entry[].changes[].value` structure and yields one
//! [`InboundMessage`] per supported message (text, image, audio). Statuses
//! and unsupported message types are skipped.

use chrono::{DateTime, Utc};
use mordomo_core::types::{InboundMessage, MediaKind, MediaRef};
use tracing::debug;

/// Extracts inbound messages from a webhook payload.
pub fn parse_webhook(payload: &serde_json::Value) -> Vec<InboundMessage> {
    let mut out = Vec::new();

    let entries = payload
        .get("entry")
        .and_then(|e| e.as_array())
        .cloned()
        .unwrap_or_default();

    for entry in &entries {
        let changes = entry
            .get("changes")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();
        for change in &changes {
            let Some(value) = change.get("value") else { continue };

            let sender_name = value
                .get("contacts")
                .and_then(|c| c.get(0))
                .and_then(|c| c.pointer("/profile/name"))
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();

            let messages = value
                .get("messages")
                .and_then(|m| m.as_array())
                .cloned()
                .unwrap_or_default();
            for msg in &messages {
                if let Some(parsed) = parse_message(msg, &sender_name) {
                    out.push(parsed);
                }
            }
        }
    }

    out
}

fn parse_message(msg: &serde_json::Value, sender_name: &str) -> Option<InboundMessage> {
    let id = msg.get("id")?.as_str()?.to_string();
    let from = msg.get("from")?.as_str()?.to_string();
    let kind = msg.get("type")?.as_str()?;

    let timestamp = msg
        .get("timestamp")
        .and_then(|t| t.as_str())
        .and_then(|t| t.parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    let (text, media) = match kind {
        "text" => {
            let body = msg.pointer("/text/body")?.as_str()?.to_string();
            (body, None)
        }
        "image" => {
            let media_id = msg.pointer("/image/id")?.as_str()?.to_string();
            let mime = msg
                .pointer("/image/mime_type")
                .and_then(|m| m.as_str())
                .unwrap_or("image/jpeg")
                .to_string();
            let caption = msg
                .pointer("/image/caption")
                .and_then(|c| c.as_str())
                .unwrap_or_default()
                .to_string();
            (
                caption,
                Some(MediaRef {
                    kind: MediaKind::Image,
                    id: media_id,
                    mime,
                }),
            )
        }
        "audio" => {
            let media_id = msg.pointer("/audio/id")?.as_str()?.to_string();
            let mime = msg
                .pointer("/audio/mime_type")
                .and_then(|m| m.as_str())
                .unwrap_or("audio/ogg")
                .to_string();
            (
                String::new(),
                Some(MediaRef {
                    kind: MediaKind::Audio,
                    id: media_id,
                    mime,
                }),
            )
        }
        other => {
            debug!(message_type = other, "skipping unsupported message type");
            return None;
        }
    };

    Some(InboundMessage {
        id,
        chat_id: from.clone(),
        sender_phone: from,
        sender_name: sender_name.to_string(),
        text,
        media,
        timestamp,
        silent: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook(messages: serde_json::Value) -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1029384756",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{"profile": {"name": "Maria"}, "wa_id": "5511912345678"}],
                        "messages": messages
                    }
                }]
            }]
        })
    }

    #[test]
    fn parses_text_message() {
        let payload = webhook(json!([{
            "id": "wamid.text1",
            "from": "5511912345678",
            "timestamp": "1772461800",
            "type": "text",
            "text": {"body": "bom dia"}
        }]));

        let messages = parse_webhook(&payload);
        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        assert_eq!(msg.id, "wamid.text1");
        assert_eq!(msg.sender_phone, "5511912345678");
        assert_eq!(msg.sender_name, "Maria");
        assert_eq!(msg.text, "bom dia");
        assert!(msg.media.is_none());
        assert!(!msg.silent);
    }

    #[test]
    fn parses_image_with_caption() {
        let payload = webhook(json!([{
            "id": "wamid.img1",
            "from": "5511912345678",
            "timestamp": "1772461800",
            "type": "image",
            "image": {"id": "media-42", "mime_type": "image/png", "caption": "nota do mercado"}
        }]));

        let messages = parse_webhook(&payload);
        assert_eq!(messages.len(), 1);
        let media = messages[0].media.as_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.id, "media-42");
        assert_eq!(media.mime, "image/png");
        assert_eq!(messages[0].text, "nota do mercado");
    }

    #[test]
    fn parses_audio_message() {
        let payload = webhook(json!([{
            "id": "wamid.audio1",
            "from": "5511912345678",
            "timestamp": "1772461800",
            "type": "audio",
            "audio": {"id": "media-77", "mime_type": "audio/ogg; codecs=opus"}
        }]));

        let messages = parse_webhook(&payload);
        assert_eq!(messages.len(), 1);
        let media = messages[0].media.as_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Audio);
        assert_eq!(media.id, "media-77");
    }

    #[test]
    fn skips_statuses_and_unsupported_types() {
        let payload = webhook(json!([{
            "id": "wamid.sticker",
            "from": "5511912345678",
            "timestamp": "1772461800",
            "type": "sticker",
            "sticker": {"id": "media-1"}
        }]));
        assert!(parse_webhook(&payload).is_empty());

        // Status-only payloads carry no messages array.
        let status_payload = json!({
            "entry": [{"changes": [{"value": {"statuses": [{"id": "wamid.x"}]}}]}]
        });
        assert!(parse_webhook(&status_payload).is_empty());
    }

    #[test]
    fn malformed_payload_yields_nothing() {
        assert!(parse_webhook(&json!({"unexpected": true})).is_empty());
        assert!(parse_webhook(&json!(null)).is_empty());
    }
}
