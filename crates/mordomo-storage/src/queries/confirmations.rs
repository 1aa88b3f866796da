// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending confirmation rows: atomic supersede, lazy expiry, terminal resolve.

use chrono::{DateTime, Utc};
use mordomo_core::MordomoError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{ConfirmationStatus, PendingConfirmation};
use crate::queries::{fmt_ts, parse_col};

fn map_confirmation(row: &Row<'_>) -> Result<PendingConfirmation, rusqlite::Error> {
    Ok(PendingConfirmation {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        kind: parse_col(2, row.get(2)?)?,
        subject_date: parse_col(3, row.get(3)?)?,
        subject_time: row
            .get::<_, Option<String>>(4)?
            .map(|s| parse_col(4, s))
            .transpose()?,
        payload: row.get(5)?,
        status: parse_col(6, row.get(6)?)?,
        created_at: parse_col(7, row.get(7)?)?,
        resolved_at: row
            .get::<_, Option<String>>(8)?
            .map(|s| parse_col(8, s))
            .transpose()?,
    })
}

const CONFIRMATION_COLUMNS: &str =
    "id, actor_id, kind, subject_date, subject_time, payload, status, created_at, resolved_at";

/// Atomically expires any pending confirmation for the same actor, then
/// inserts the new pending row. One transaction: a reader can never observe
/// two pending rows for the actor.
pub async fn supersede_and_insert(
    db: &Database,
    confirmation: &PendingConfirmation,
) -> Result<(), MordomoError> {
    let c = confirmation.clone();
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE confirmations SET status = 'expired', resolved_at = ?2
                 WHERE actor_id = ?1 AND status = 'pending'",
                params![c.actor_id, now],
            )?;
            tx.execute(
                "INSERT INTO confirmations
                 (id, actor_id, kind, subject_date, subject_time, payload, status,
                  created_at, resolved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
                params![
                    c.id,
                    c.actor_id,
                    c.kind.to_string(),
                    c.subject_date.to_string(),
                    c.subject_time.map(|t| t.format("%H:%M:%S").to_string()),
                    c.payload,
                    c.status.to_string(),
                    fmt_ts(c.created_at),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Returns the pending confirmation for an actor, if any.
pub async fn get_pending(
    db: &Database,
    actor_id: i64,
) -> Result<Option<PendingConfirmation>, MordomoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONFIRMATION_COLUMNS} FROM confirmations
                 WHERE actor_id = ?1 AND status = 'pending'"
            ))?;
            let mut rows = stmt.query_map(params![actor_id], map_confirmation)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transitions a confirmation out of `pending`. Returns `false` when the row
/// was not pending, which callers use as the apply-at-most-once gate.
pub async fn resolve(
    db: &Database,
    id: &str,
    status: ConfirmationStatus,
    resolved_at: DateTime<Utc>,
) -> Result<bool, MordomoError> {
    let id = id.to_string();
    let status = status.to_string();
    let resolved_at = fmt_ts(resolved_at);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE confirmations SET status = ?2, resolved_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, status, resolved_at],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Expires every pending confirmation created before the cutoff. Returns the
/// number of rows transitioned.
pub async fn expire_before(db: &Database, cutoff: DateTime<Utc>) -> Result<u64, MordomoError> {
    let cutoff = fmt_ts(cutoff);
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE confirmations SET status = 'expired', resolved_at = ?2
                 WHERE status = 'pending' AND created_at < ?1",
                params![cutoff, now],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
