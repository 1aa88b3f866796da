// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel session supervisor.
//!
//! Owns the lifecycle of the chat channel connection: a bounded retry
//! initialize sequence, disconnect detection with automatic restart, a
//! generation-guarded manual reconnect, and an independent periodic health
//! check. The supervisor depends only on the narrow [`ChannelAdapter`]
//! contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mordomo_config::model::SupervisorConfig;
use mordomo_core::types::{AlertEvent, InboundMessage};
use mordomo_core::{AlertSink, ChannelAdapter, MordomoError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// States of the channel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Initializing,
    WaitingHandshake,
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::WaitingHandshake => write!(f, "waiting_handshake"),
            SessionState::Connected => write!(f, "connected"),
        }
    }
}

/// Supervises the channel session connection.
pub struct ChannelSupervisor {
    channel: Arc<dyn ChannelAdapter>,
    alerts: Arc<dyn AlertSink>,
    config: SupervisorConfig,
    /// Whether the channel feature is enabled; drives the health check alert.
    enabled: bool,
    state: Mutex<SessionState>,
    /// Bumped by manual reconnect. A retry loop holding a stale generation
    /// stops instead of racing the new one; this is the detach-listeners
    /// step of the reconnect sequence.
    generation: AtomicU64,
}

impl ChannelSupervisor {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        alerts: Arc<dyn AlertSink>,
        config: SupervisorConfig,
        enabled: bool,
    ) -> Self {
        Self {
            channel,
            alerts,
            config,
            enabled,
            state: Mutex::new(SessionState::Disconnected),
            generation: AtomicU64::new(0),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    /// Runs the initialize sequence: up to `max_attempts` connection
    /// attempts, `retry_delay_secs` apart. Exhausting the attempts leaves
    /// the session disconnected and raises an operational alert.
    pub async fn initialize(&self) -> Result<(), MordomoError> {
        let generation = self.generation.load(Ordering::SeqCst);

        for attempt in 1..=self.config.max_attempts {
            if self.generation.load(Ordering::SeqCst) != generation {
                return Err(MordomoError::Channel {
                    message: "initialize superseded by manual reconnect".to_string(),
                    source: None,
                });
            }

            self.set_state(SessionState::Initializing);
            info!(attempt, max = self.config.max_attempts, "connecting channel session");
            self.set_state(SessionState::WaitingHandshake);

            match self.channel.connect().await {
                Ok(()) => {
                    if self.generation.load(Ordering::SeqCst) != generation {
                        return Err(MordomoError::Channel {
                            message: "initialize superseded by manual reconnect".to_string(),
                            source: None,
                        });
                    }
                    self.set_state(SessionState::Connected);
                    info!("channel session connected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, attempt, "channel connect attempt failed");
                    self.set_state(SessionState::Disconnected);
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs))
                            .await;
                    }
                }
            }
        }

        self.alerts
            .notify(AlertEvent::RetriesExhausted {
                attempts: self.config.max_attempts,
            })
            .await;
        error!(
            attempts = self.config.max_attempts,
            "channel connect retries exhausted"
        );
        Err(MordomoError::Channel {
            message: format!(
                "channel connect retries exhausted after {} attempts",
                self.config.max_attempts
            ),
            source: None,
        })
    }

    /// Manual reconnect.
    ///
    /// Rejected while the session is connected or an initialize sequence is
    /// running, without touching the live session. Otherwise the supervisor
    /// generation is bumped first (detaching any stale retry loop), the old
    /// session is torn down, and a fresh initialize sequence starts with the
    /// attempt counter back at zero.
    pub async fn reconnect(&self) -> Result<(), MordomoError> {
        let state = self.state();
        if matches!(
            state,
            SessionState::Connected | SessionState::Initializing | SessionState::WaitingHandshake
        ) {
            return Err(MordomoError::Channel {
                message: format!("reconnect rejected: session is {state}"),
                source: None,
            });
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.channel.shutdown().await {
            warn!(error = %e, "stale session teardown reported an error");
        }

        info!("manual reconnect: starting fresh initialize sequence");
        self.initialize().await
    }

    /// Returns the next inbound message, transparently restarting the
    /// session on channel failure. Returns `None` when cancelled or when a
    /// restart exhausted its retries.
    pub async fn next_message(&self, cancel: &CancellationToken) -> Option<InboundMessage> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                result = self.channel.receive() => match result {
                    Ok(msg) => return Some(msg),
                    Err(e) => {
                        error!(error = %e, "channel receive failed, treating as disconnect");
                        self.set_state(SessionState::Disconnected);
                        self.alerts
                            .notify(AlertEvent::ChannelDisconnected {
                                reason: e.to_string(),
                            })
                            .await;
                        // Unexpected disconnect: restart the retry loop from
                        // the top with a fresh attempt counter.
                        if self.initialize().await.is_err() {
                            return None;
                        }
                    }
                }
            }
        }
    }

    /// Spawns the periodic health check, independent of reconnect logic:
    /// if the channel feature is enabled but the session is not connected,
    /// an alert is raised each interval.
    pub fn spawn_health_check(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let period = Duration::from_secs(supervisor.config.health_check_interval_secs);
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let state = supervisor.state();
                        if supervisor.enabled && state != SessionState::Connected {
                            warn!(state = %state, "health check: channel enabled but not connected");
                            supervisor
                                .alerts
                                .notify(AlertEvent::HealthCheckFailed {
                                    detail: format!(
                                        "channel enabled but session is {state}"
                                    ),
                                })
                                .await;
                        }
                    }
                }
            }
        })
    }
}
