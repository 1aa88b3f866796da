// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for the Mordomo household agent.
//!
//! Implements [`ChannelAdapter`] over the Cloud API: an axum webhook server
//! receives signed inbound deliveries, the Graph API sends replies and
//! serves media downloads. Connection state lives behind interior
//! mutability so the session supervisor and the router share one instance.

pub mod parse;
pub mod webhook;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mordomo_config::model::WhatsAppConfig;
use mordomo_core::traits::{ChannelAdapter, PluginAdapter};
use mordomo_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MediaRef, MessageId,
    OutboundMessage,
};
use mordomo_core::MordomoError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::webhook::{webhook_router, WebhookState};

#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    url: String,
}

/// WhatsApp Cloud API channel adapter.
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    phone_number_id: String,
    http: reqwest::Client,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    server: Mutex<Option<tokio::task::JoinHandle<()>>>,
    local_addr: Mutex<Option<std::net::SocketAddr>>,
    connected: Arc<AtomicBool>,
}

impl WhatsAppChannel {
    /// Creates the adapter. Requires `access_token` and `phone_number_id`.
    pub fn new(config: WhatsAppConfig) -> Result<Self, MordomoError> {
        let token = config.access_token.as_deref().ok_or_else(|| {
            MordomoError::Config("whatsapp.access_token is required for the adapter".into())
        })?;
        let phone_number_id = config.phone_number_id.clone().ok_or_else(|| {
            MordomoError::Config("whatsapp.phone_number_id is required for the adapter".into())
        })?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| MordomoError::Config(format!("invalid whatsapp access_token: {e}")))?;
        headers.insert("authorization", value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MordomoError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        Ok(Self {
            config,
            phone_number_id,
            http,
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the webhook server bound to, once connected.
    pub async fn local_addr(&self) -> Option<std::net::SocketAddr> {
        *self.local_addr.lock().await
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, MordomoError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("webhook server not running".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), MordomoError> {
        if let Some(handle) = self.server.lock().await.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        debug!("whatsapp channel shut down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_images: true,
            supports_voice: true,
            supports_documents: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&self) -> Result<(), MordomoError> {
        let mut server = self.server.lock().await;
        if server.is_some() && self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        // A dead server task may still hold the port; stop it first.
        if let Some(stale) = server.take() {
            stale.abort();
        }

        let listener = tokio::net::TcpListener::bind(&self.config.webhook_bind)
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!(
                    "failed to bind webhook server on {}: {e}",
                    self.config.webhook_bind
                ),
                source: Some(Box::new(e)),
            })?;
        let addr = listener.local_addr().map_err(|e| MordomoError::Channel {
            message: format!("failed to read webhook address: {e}"),
            source: Some(Box::new(e)),
        })?;

        let router = webhook_router(WebhookState {
            verify_token: self.config.verify_token.clone(),
            app_secret: self.config.app_secret.clone(),
            inbound_tx: self.inbound_tx.clone(),
        });

        let connected = Arc::clone(&self.connected);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                warn!(error = %e, "webhook server stopped unexpectedly");
            }
            connected.store(false, Ordering::SeqCst);
        });

        *server = Some(handle);
        *self.local_addr.lock().await = Some(addr);
        self.connected.store(true, Ordering::SeqCst);
        info!(addr = %addr, "whatsapp webhook server listening");
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, MordomoError> {
        let mut body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": msg.chat_id,
            "type": "text",
            "text": {"preview_url": false, "body": msg.text},
        });
        if let Some(reply_to) = &msg.reply_to {
            body["context"] = serde_json::json!({"message_id": reply_to});
        }

        let response = self
            .http
            .post(format!(
                "{}/{}/messages",
                self.config.api_base, self.phone_number_id
            ))
            .json(&body)
            .send()
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MordomoError::Channel {
                message: format!("send returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SendResponse = response.json().await.map_err(|e| MordomoError::Channel {
            message: format!("malformed send response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| MordomoError::Channel {
                message: "send response carried no message id".into(),
                source: None,
            })?;
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, MordomoError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| MordomoError::Channel {
            message: "whatsapp inbound channel closed".into(),
            source: None,
        })
    }

    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, MordomoError> {
        // Two steps: the media id resolves to a short-lived URL, then the
        // bytes are fetched from it.
        let metadata: MediaMetadata = self
            .http
            .get(format!("{}/{}", self.config.api_base, media.id))
            .send()
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!("media metadata request failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .json()
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!("malformed media metadata: {e}"),
                source: Some(Box::new(e)),
            })?;

        let bytes = self
            .http
            .get(&metadata.url)
            .send()
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!("media download failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .bytes()
            .await
            .map_err(|e| MordomoError::Channel {
                message: format!("media body read failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_base: String, webhook_bind: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            enabled: true,
            access_token: Some("EAAB-token".to_string()),
            phone_number_id: Some("10987654321".to_string()),
            verify_token: Some("verify".to_string()),
            app_secret: None,
            webhook_bind: webhook_bind.to_string(),
            api_base,
        }
    }

    #[test]
    fn new_requires_access_token() {
        let config = WhatsAppConfig::default();
        assert!(WhatsAppChannel::new(config).is_err());
    }

    #[test]
    fn new_requires_phone_number_id() {
        let config = WhatsAppConfig {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        assert!(WhatsAppChannel::new(config).is_err());
    }

    #[test]
    fn capabilities_are_declared() {
        let channel =
            WhatsAppChannel::new(make_config("http://unused".into(), "127.0.0.1:0")).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_images);
        assert!(caps.supports_voice);
        assert_eq!(caps.max_message_length, Some(4096));
        assert_eq!(channel.name(), "whatsapp");
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[tokio::test]
    async fn send_posts_to_graph_and_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/10987654321/messages"))
            .and(body_partial_json(serde_json::json!({
                "to": "5511912345678",
                "text": {"body": "Entrada registrada às 08:00."}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "wamid.out1"}]
            })))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(make_config(server.uri(), "127.0.0.1:0")).unwrap();
        let id = channel
            .send(OutboundMessage {
                chat_id: "5511912345678".to_string(),
                text: "Entrada registrada às 08:00.".to_string(),
                reply_to: Some("wamid.in1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(id.0, "wamid.out1");
    }

    #[tokio::test]
    async fn send_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/10987654321/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(make_config(server.uri(), "127.0.0.1:0")).unwrap();
        let result = channel
            .send(OutboundMessage {
                chat_id: "5511912345678".to_string(),
                text: "oi".to_string(),
                reply_to: None,
            })
            .await;
        assert!(matches!(result, Err(MordomoError::Channel { .. })));
    }

    #[tokio::test]
    async fn download_media_follows_metadata_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/lookaside/media-42", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lookaside/media-42"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(make_config(server.uri(), "127.0.0.1:0")).unwrap();
        let media = MediaRef {
            kind: mordomo_core::types::MediaKind::Image,
            id: "media-42".to_string(),
            mime: "image/jpeg".to_string(),
        };
        assert_eq!(channel.download_media(&media).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn connect_receive_round_trip_through_webhook() {
        let channel =
            WhatsAppChannel::new(make_config("http://unused".into(), "127.0.0.1:0")).unwrap();
        channel.connect().await.unwrap();
        let addr = channel.local_addr().await.unwrap();
        assert_eq!(
            channel.health_check().await.unwrap(),
            HealthStatus::Healthy
        );

        let payload = serde_json::json!({
            "entry": [{"changes": [{"value": {
                "contacts": [{"profile": {"name": "Maria"}}],
                "messages": [{
                    "id": "wamid.rt1",
                    "from": "5511912345678",
                    "timestamp": "1772461800",
                    "type": "text",
                    "text": {"body": "bom dia"}
                }]
            }}]}]
        });
        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/webhook"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let msg = channel.receive().await.unwrap();
        assert_eq!(msg.id, "wamid.rt1");
        assert_eq!(msg.text, "bom dia");

        channel.shutdown().await.unwrap();
        assert!(matches!(
            channel.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
