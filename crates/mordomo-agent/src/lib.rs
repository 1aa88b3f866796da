// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop for the Mordomo household agent.
//!
//! The [`AgentLoop`] wires the channel session supervisor to the message
//! router: it initializes the session, forwards every inbound message into
//! the router's per-actor pipeline, and drains cleanly on shutdown.

pub mod alert;
pub mod supervisor;

use std::sync::Arc;

use mordomo_core::{MordomoError, RecordStore};
use mordomo_router::MessageRouter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use alert::ChannelAlertSink;
pub use supervisor::{ChannelSupervisor, SessionState};

/// Coordinates the supervisor, router, and storage lifecycle.
pub struct AgentLoop {
    supervisor: Arc<ChannelSupervisor>,
    router: Arc<MessageRouter>,
    records: Arc<dyn RecordStore>,
}

impl AgentLoop {
    pub fn new(
        supervisor: Arc<ChannelSupervisor>,
        router: Arc<MessageRouter>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            supervisor,
            router,
            records,
        }
    }

    /// Runs until the cancellation token fires or the channel session cannot
    /// be kept alive. A single message's failure never stops the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), MordomoError> {
        self.supervisor.initialize().await?;
        let health = self.supervisor.spawn_health_check(cancel.child_token());

        info!("agent loop running");
        while let Some(msg) = self.supervisor.next_message(&cancel).await {
            if let Err(e) = self.router.handle(msg).await {
                error!(error = %e, "failed to queue inbound message");
            }
        }

        // Drain per-actor lanes before releasing storage.
        self.router.shutdown().await;
        health.abort();
        self.records.close().await?;

        info!("agent loop stopped");
        Ok(())
    }
}
