// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mordomo serve` command implementation.
//!
//! Wires the SQLite store, AI service adapters, WhatsApp channel, message
//! router, and channel session supervisor, then runs the agent loop until a
//! shutdown signal arrives.

use std::sync::Arc;

use mordomo_agent::{AgentLoop, ChannelAlertSink, ChannelSupervisor};
use mordomo_classifier::{AiClassifier, SpeechClient, VisionClient};
use mordomo_config::MordomoConfig;
use mordomo_core::error::MordomoError;
use mordomo_core::{ChannelAdapter, RecordStore};
use mordomo_router::MessageRouter;
use mordomo_storage::SqliteStore;
use mordomo_whatsapp::WhatsAppChannel;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Initializes the tracing subscriber from config, honoring `RUST_LOG`.
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `mordomo serve` command.
pub async fn run_serve(config: MordomoConfig) -> Result<(), MordomoError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting mordomo serve");

    if !config.whatsapp.enabled {
        return Err(MordomoError::Config(
            "whatsapp channel is disabled; set [whatsapp] enabled = true in mordomo.toml".into(),
        ));
    }

    // Storage.
    let records: Arc<dyn RecordStore> = {
        let store = SqliteStore::new(config.storage.clone());
        store.initialize().await?;
        Arc::new(store)
    };

    // External AI services.
    let classifier = Arc::new(AiClassifier::new(config.classifier.clone())?);
    let speech = Arc::new(SpeechClient::new(config.classifier.clone())?);
    let vision = Arc::new(VisionClient::new(config.classifier.clone())?);

    // Channel and operator alerting.
    let channel: Arc<dyn ChannelAdapter> =
        Arc::new(WhatsAppChannel::new(config.whatsapp.clone())?);
    let alerts = Arc::new(ChannelAlertSink::new(
        channel.clone(),
        config.agent.admin_chat_id.clone(),
    ));

    // Router and supervisor.
    let router = Arc::new(MessageRouter::new(
        records.clone(),
        classifier,
        speech,
        vision,
        channel.clone(),
        alerts.clone(),
        &config,
    ));
    let supervisor = Arc::new(ChannelSupervisor::new(
        channel,
        alerts,
        config.supervisor.clone(),
        config.whatsapp.enabled,
    ));

    // Graceful shutdown on ctrl-c.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    AgentLoop::new(supervisor, router, records).run(cancel).await
}
