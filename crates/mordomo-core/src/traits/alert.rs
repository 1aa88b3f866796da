// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operational alert sink trait.

use async_trait::async_trait;

use crate::types::AlertEvent;

/// Fire-and-forget operator notification sink.
///
/// Used for disconnects, retry exhaustion, health failures, and rate-limit
/// events. Implementations swallow and log their own failures; delivery must
/// never block message processing.
#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    async fn notify(&self, event: AlertEvent);
}
