// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook endpoints: subscription verification and signed message delivery.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use mordomo_core::types::InboundMessage;

use crate::parse::parse_webhook;

type HmacSha256 = Hmac<Sha256>;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
    pub inbound_tx: mpsc::Sender<InboundMessage>,
}

/// Builds the webhook router.
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

/// GET /webhook: the platform's subscription handshake. Echoes the
/// challenge when the verify token matches.
async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    if mode == Some("subscribe")
        && token.is_some()
        && token == state.verify_token.as_ref()
        && let Some(challenge) = challenge
    {
        debug!("webhook subscription verified");
        return (StatusCode::OK, challenge.clone()).into_response();
    }

    warn!("webhook verification rejected");
    StatusCode::FORBIDDEN.into_response()
}

/// POST /webhook: signed message delivery. The signature is validated over
/// the raw body before parsing.
async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref secret) = state.app_secret {
        let provided = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !signature_matches(secret, &body, provided) {
            warn!("webhook signature mismatch, rejecting delivery");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "webhook body is not valid JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    for msg in parse_webhook(&payload) {
        if state.inbound_tx.send(msg).await.is_err() {
            warn!("inbound channel closed, dropping webhook message");
        }
    }

    // Always acknowledge understood deliveries; the platform retries
    // non-2xx responses, and de-duplication happens downstream anyway.
    StatusCode::OK
}

/// Validates `sha256=<hex>` signatures.
fn signature_matches(secret: &str, body: &[u8], provided: &str) -> bool {
    let Some(provided_hex) = provided.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(provided_bytes) = hex::decode(provided_hex) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    // Constant-time comparison via the Mac verifier.
    mac.verify_slice(&provided_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_with(
        verify_token: Option<&str>,
        app_secret: Option<&str>,
    ) -> (WebhookState, mpsc::Receiver<InboundMessage>) {
        let (tx, rx) = mpsc::channel(16);
        (
            WebhookState {
                verify_token: verify_token.map(String::from),
                app_secret: app_secret.map(String::from),
                inbound_tx: tx,
            },
            rx,
        )
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn text_payload() -> String {
        serde_json::json!({
            "entry": [{"changes": [{"value": {
                "contacts": [{"profile": {"name": "Maria"}}],
                "messages": [{
                    "id": "wamid.1",
                    "from": "5511912345678",
                    "timestamp": "1772461800",
                    "type": "text",
                    "text": {"body": "bom dia"}
                }]
            }}]}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn get_verify_echoes_challenge_on_token_match() {
        let (state, _rx) = state_with(Some("secret-token"), None);
        let app = webhook_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=secret-token&hub.challenge=12345")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"12345");
    }

    #[tokio::test]
    async fn get_verify_rejects_wrong_token() {
        let (state, _rx) = state_with(Some("secret-token"), None);
        let app = webhook_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=12345")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn post_with_valid_signature_forwards_messages() {
        let (state, mut rx) = state_with(None, Some("app-secret"));
        let app = webhook_router(state);
        let body = text_payload();
        let signature = sign("app-secret", body.as_bytes());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("x-hub-signature-256", signature)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.text, "bom dia");
        assert_eq!(msg.sender_name, "Maria");
    }

    #[tokio::test]
    async fn post_with_bad_signature_is_unauthorized() {
        let (state, mut rx) = state_with(None, Some("app-secret"));
        let app = webhook_router(state);
        let body = text_payload();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("x-hub-signature-256", "sha256=deadbeef")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn post_without_secret_configured_skips_validation() {
        let (state, mut rx) = state_with(None, None);
        let app = webhook_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(text_payload()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(rx.recv().await.is_some());
    }
}
