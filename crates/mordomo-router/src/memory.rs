// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat bounded conversation memory.
//!
//! Used only to make classifier prompts conversationally coherent; not an
//! audit record and safe to lose on restart. Each chat keeps at most
//! `max_entries` lines no older than `max_age`. Idle chats are evicted by a
//! sweep piggybacked on appends and throttled process-wide, mirroring the
//! confirmation store's lazy expiry design.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use mordomo_config::model::MemoryConfig;
use tracing::debug;

struct Entry {
    at: DateTime<Utc>,
    line: String,
}

/// Bounded, time-boxed per-chat context. Owned by the router and passed into
/// classifier calls; there is no ambient global state.
pub struct ConversationMemory {
    chats: DashMap<String, Vec<Entry>>,
    max_entries: usize,
    max_age: Duration,
    sweep_interval: Duration,
    last_sweep_ms: AtomicI64,
}

impl ConversationMemory {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            chats: DashMap::new(),
            max_entries: config.max_entries,
            max_age: Duration::minutes(config.max_age_minutes),
            sweep_interval: Duration::minutes(config.sweep_interval_minutes),
            last_sweep_ms: AtomicI64::new(0),
        }
    }

    /// Appends one line ("speaker: text") and trims the chat's window.
    pub fn append(&self, chat_id: &str, speaker: &str, text: &str) {
        let now = Utc::now();
        {
            let mut entries = self.chats.entry(chat_id.to_string()).or_default();
            entries.push(Entry {
                at: now,
                line: format!("{speaker}: {text}"),
            });

            let cutoff = now - self.max_age;
            entries.retain(|e| e.at >= cutoff);
            let excess = entries.len().saturating_sub(self.max_entries);
            if excess > 0 {
                entries.drain(..excess);
            }
        }
        self.maybe_sweep(now);
    }

    /// Recent lines for a chat, oldest first.
    pub fn context(&self, chat_id: &str) -> Vec<String> {
        let cutoff = Utc::now() - self.max_age;
        self.chats
            .get(chat_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.at >= cutoff)
                    .map(|e| e.line.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of chats currently held.
    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    /// Evicts chats whose newest entry is past the age window, at most once
    /// per sweep interval.
    fn maybe_sweep(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now_ms - last < self.sweep_interval.num_milliseconds() {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let cutoff = now - self.max_age;
        let before = self.chats.len();
        self.chats
            .retain(|_, entries| entries.iter().any(|e| e.at >= cutoff));
        let evicted = before - self.chats.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle chats from conversation memory");
        }
    }
}
