// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document, delivery, and expense inserts.

use mordomo_core::MordomoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{DeliveryRecord, DocumentRecord, ExpenseRecord};
use crate::queries::fmt_ts;

/// Inserts a document record.
pub async fn insert_document(db: &Database, doc: &DocumentRecord) -> Result<(), MordomoError> {
    let doc = doc.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, actor_id, doc_kind, number, issued_at, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    doc.id,
                    doc.actor_id,
                    doc.doc_kind,
                    doc.number,
                    doc.issued_at,
                    doc.notes,
                    fmt_ts(doc.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts a delivery record.
pub async fn insert_delivery(db: &Database, delivery: &DeliveryRecord) -> Result<(), MordomoError> {
    let delivery = delivery.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO deliveries (id, actor_id, description, received_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    delivery.id,
                    delivery.actor_id,
                    delivery.description,
                    fmt_ts(delivery.received_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts an expense (invoice or receipt) record.
pub async fn insert_expense(db: &Database, expense: &ExpenseRecord) -> Result<(), MordomoError> {
    let expense = expense.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO expenses (id, actor_id, kind, vendor, total_cents, items_json, incurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    expense.id,
                    expense.actor_id,
                    expense.kind.to_string(),
                    expense.vendor,
                    expense.total_cents,
                    expense.items_json,
                    fmt_ts(expense.incurred_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
