// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending confirmation store.
//!
//! Guarantees at most one pending question per actor, with lazy time-based
//! expiry: a pending row older than the TTL reads as expired, persisted at
//! read time. The global expiry sweep is a side effect of reads, throttled
//! process-wide to bound write amplification. There is no background timer.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use mordomo_config::model::ConfirmationConfig;
use mordomo_core::types::{
    ConfirmationPayload, ConfirmationStatus, IntentKind, PendingConfirmation,
};
use mordomo_core::{MordomoError, RecordStore};
use tracing::{debug, warn};

/// Terminal decision applied to a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    Denied,
}

impl From<Resolution> for ConfirmationStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Confirmed => ConfirmationStatus::Confirmed,
            Resolution::Denied => ConfirmationStatus::Denied,
        }
    }
}

/// Store governing creation, lazy expiry, and resolution of pending
/// confirmations.
pub struct PendingStore {
    records: Arc<dyn RecordStore>,
    ttl: Duration,
    sweep_interval: Duration,
    /// Unix milliseconds of the last global sweep, shared process-wide
    /// through this store instance.
    last_sweep_ms: AtomicI64,
}

impl PendingStore {
    pub fn new(records: Arc<dyn RecordStore>, config: &ConfirmationConfig) -> Self {
        Self {
            records,
            ttl: Duration::minutes(config.ttl_minutes),
            sweep_interval: Duration::minutes(config.sweep_interval_minutes),
            last_sweep_ms: AtomicI64::new(0),
        }
    }

    /// Creates a pending confirmation for an actor, atomically expiring any
    /// prior pending one for the same actor. Returns the new id.
    pub async fn create(
        &self,
        actor_id: i64,
        kind: IntentKind,
        subject_date: NaiveDate,
        subject_time: Option<NaiveTime>,
        payload: &ConfirmationPayload,
    ) -> Result<String, MordomoError> {
        let confirmation = PendingConfirmation {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id,
            kind,
            subject_date,
            subject_time,
            payload: serde_json::to_string(payload)
                .map_err(|e| MordomoError::Internal(format!("payload serialization: {e}")))?,
            status: ConfirmationStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };

        self.records
            .supersede_and_insert_confirmation(&confirmation)
            .await?;

        debug!(
            actor_id,
            kind = %kind,
            confirmation_id = %confirmation.id,
            "pending confirmation created"
        );
        Ok(confirmation.id)
    }

    /// Returns the actor's pending confirmation, treating an over-TTL entry
    /// as expired (the transition is persisted before returning `None`).
    ///
    /// As a side effect, runs the throttled global expiry sweep.
    pub async fn get_pending(
        &self,
        actor_id: i64,
    ) -> Result<Option<PendingConfirmation>, MordomoError> {
        self.maybe_sweep().await;

        let Some(pending) = self.records.get_pending_confirmation(actor_id).await? else {
            return Ok(None);
        };

        if Utc::now() - pending.created_at >= self.ttl {
            // Lazy per-row expiry: persisted immediately so the row can never
            // transition to confirmed/denied afterward.
            self.records
                .resolve_confirmation(&pending.id, ConfirmationStatus::Expired, Utc::now())
                .await?;
            debug!(
                actor_id,
                confirmation_id = %pending.id,
                "pending confirmation expired on read"
            );
            return Ok(None);
        }

        Ok(Some(pending))
    }

    /// Transitions a pending confirmation to confirmed or denied. Returns
    /// `false` when the entry was no longer pending (expired, superseded, or
    /// already resolved); callers must not apply the effect in that case.
    pub async fn resolve(&self, id: &str, resolution: Resolution) -> Result<bool, MordomoError> {
        self.records
            .resolve_confirmation(id, resolution.into(), Utc::now())
            .await
    }

    /// Deserializes the payload captured at question time.
    pub fn payload(confirmation: &PendingConfirmation) -> Result<ConfirmationPayload, MordomoError> {
        serde_json::from_str(&confirmation.payload)
            .map_err(|e| MordomoError::Internal(format!("payload deserialization: {e}")))
    }

    /// Runs the global expiry sweep if the throttle interval has elapsed.
    ///
    /// Sweep failures are logged, never propagated: reads must keep working
    /// when the sweep cannot.
    async fn maybe_sweep(&self) {
        let now_ms = Utc::now().timestamp_millis();
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now_ms - last < self.sweep_interval.num_milliseconds() {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Another reader claimed this sweep window.
            return;
        }

        let cutoff = Utc::now() - self.ttl;
        match self.records.expire_confirmations_before(cutoff).await {
            Ok(0) => {}
            Ok(count) => debug!(count, "expired stale pending confirmations"),
            Err(e) => warn!(error = %e, "confirmation expiry sweep failed"),
        }
    }
}
