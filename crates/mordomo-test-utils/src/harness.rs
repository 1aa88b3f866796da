// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: tempfile-backed storage and message builders.

use std::sync::Arc;

use chrono::Utc;
use mordomo_config::model::StorageConfig;
use mordomo_config::MordomoConfig;
use mordomo_core::types::{InboundMessage, MediaKind, MediaRef};
use mordomo_core::RecordStore;
use mordomo_storage::SqliteStore;
use tempfile::TempDir;

/// Opens an initialized SQLite store in a temp directory. Keep the
/// `TempDir` alive for the duration of the test.
pub async fn temp_store() -> (Arc<SqliteStore>, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SqliteStore::new(StorageConfig {
        database_path: dir
            .path()
            .join("mordomo-test.db")
            .to_str()
            .expect("utf-8 temp path")
            .to_string(),
        wal_mode: true,
    });
    store.initialize().await.expect("initialize storage");
    (Arc::new(store), dir)
}

/// A default config suitable for tests.
pub fn test_config() -> MordomoConfig {
    MordomoConfig::default()
}

/// Builds a plain text inbound message with fresh timestamp.
pub fn make_text_message(id: &str, chat_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender_phone: "+55 11 91234-5678".to_string(),
        sender_name: "Maria".to_string(),
        text: text.to_string(),
        media: None,
        timestamp: Utc::now(),
        silent: false,
    }
}

/// Builds an inbound message carrying media.
pub fn make_media_message(
    id: &str,
    chat_id: &str,
    caption: &str,
    kind: MediaKind,
    media_id: &str,
) -> InboundMessage {
    let mime = match kind {
        MediaKind::Image => "image/jpeg",
        MediaKind::Audio => "audio/ogg",
    };
    InboundMessage {
        media: Some(MediaRef {
            kind,
            id: media_id.to_string(),
            mime: mime.to_string(),
        }),
        ..make_text_message(id, chat_id, caption)
    }
}
