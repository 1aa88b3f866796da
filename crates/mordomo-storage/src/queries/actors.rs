// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actor lookup and auto-creation.

use chrono::Utc;
use mordomo_core::text::fold_text;
use mordomo_core::MordomoError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{Actor, NewActor};
use crate::queries::{fmt_ts, parse_col};

fn map_actor(row: &Row<'_>) -> Result<Actor, rusqlite::Error> {
    Ok(Actor {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        role: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
        created_at: parse_col(5, row.get(5)?)?,
    })
}

const ACTOR_COLUMNS: &str = "id, name, phone, role, active, created_at";

/// Looks up an active actor by normalized phone number.
pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Actor>, MordomoError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTOR_COLUMNS} FROM actors WHERE phone = ?1 AND active = 1"
            ))?;
            let mut rows = stmt.query_map(params![phone], map_actor)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Looks up an active actor by folded display name.
pub async fn find_by_name(db: &Database, folded: &str) -> Result<Option<Actor>, MordomoError> {
    let folded = folded.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTOR_COLUMNS} FROM actors
                 WHERE name_folded = ?1 AND active = 1 AND id != 0
                 LIMIT 1"
            ))?;
            let mut rows = stmt.query_map(params![folded], map_actor)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetches an actor by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Actor>, MordomoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTOR_COLUMNS} FROM actors WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], map_actor)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Creates an actor from a chat identity and returns the stored row.
pub async fn create(db: &Database, new: &NewActor) -> Result<Actor, MordomoError> {
    let name = new.name.clone();
    let folded = fold_text(&new.name);
    let phone = new.phone.clone();
    let created_at = Utc::now();
    let created_at_s = fmt_ts(created_at);

    let id = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO actors (name, name_folded, phone, active, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![name, folded, phone, created_at_s],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    Ok(Actor {
        id,
        name: new.name.clone(),
        phone: new.phone.clone(),
        role: None,
        active: true,
        created_at,
    })
}

/// Names of all active actors (excluding the unknown seed row).
pub async fn list_names(db: &Database) -> Result<Vec<String>, MordomoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM actors WHERE active = 1 AND id != 0 ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let names = rows.collect::<Result<Vec<String>, rusqlite::Error>>()?;
            Ok(names)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
