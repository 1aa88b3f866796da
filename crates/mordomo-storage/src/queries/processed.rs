// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel message de-duplication ledger.

use chrono::Utc;
use mordomo_core::MordomoError;
use rusqlite::params;

use crate::database::Database;
use crate::queries::fmt_ts;

/// Records a channel message id. Returns `false` when the id was already
/// present, meaning the message is a re-delivery and must be skipped.
pub async fn mark(db: &Database, channel_message_id: &str) -> Result<bool, MordomoError> {
    let id = channel_message_id.to_string();
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO processed_messages (channel_message_id, processed_at)
                 VALUES (?1, ?2)",
                params![id, now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
