// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migrations stepped through `PRAGMA user_version`.
//!
//! Each migration runs in its own transaction; the version bump commits with
//! the DDL, so a crash mid-migration leaves the previous version intact.

use rusqlite::Connection;
use tracing::info;

/// Ordered migration batches. Index + 1 is the resulting user_version.
const MIGRATIONS: &[&str] = &[
    // V1: initial schema.
    "CREATE TABLE actors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        name_folded TEXT NOT NULL,
        phone TEXT,
        role TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX idx_actors_phone ON actors(phone) WHERE phone IS NOT NULL;
    CREATE INDEX idx_actors_name_folded ON actors(name_folded);
    INSERT INTO actors (id, name, name_folded, active, created_at)
        VALUES (0, 'unknown', 'unknown', 1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));

    CREATE TABLE processed_messages (
        channel_message_id TEXT PRIMARY KEY,
        processed_at TEXT NOT NULL
    );

    CREATE TABLE attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        actor_id INTEGER NOT NULL REFERENCES actors(id),
        date TEXT NOT NULL,
        entrada TEXT,
        saida TEXT,
        lunch_out TEXT,
        lunch_return TEXT,
        missing_entrada INTEGER NOT NULL DEFAULT 0,
        UNIQUE(actor_id, date)
    );

    CREATE TABLE confirmations (
        id TEXT PRIMARY KEY,
        actor_id INTEGER NOT NULL REFERENCES actors(id),
        kind TEXT NOT NULL,
        subject_date TEXT NOT NULL,
        subject_time TEXT,
        payload TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        resolved_at TEXT
    );
    CREATE INDEX idx_confirmations_actor_pending
        ON confirmations(actor_id) WHERE status = 'pending';

    CREATE TABLE documents (
        id TEXT PRIMARY KEY,
        actor_id INTEGER REFERENCES actors(id),
        doc_kind TEXT,
        number TEXT,
        issued_at TEXT,
        notes TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE deliveries (
        id TEXT PRIMARY KEY,
        actor_id INTEGER REFERENCES actors(id),
        description TEXT NOT NULL,
        received_at TEXT NOT NULL
    );

    CREATE TABLE expenses (
        id TEXT PRIMARY KEY,
        actor_id INTEGER REFERENCES actors(id),
        kind TEXT NOT NULL,
        vendor TEXT,
        total_cents INTEGER,
        items_json TEXT,
        incurred_at TEXT NOT NULL
    );

    CREATE TABLE shopping_lists (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        status TEXT NOT NULL DEFAULT 'open',
        created_at TEXT NOT NULL
    );

    CREATE TABLE shopping_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        list_id INTEGER NOT NULL REFERENCES shopping_lists(id),
        name TEXT NOT NULL,
        quantity REAL,
        purchased INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE suggestions (
        id TEXT PRIMARY KEY,
        actor_id INTEGER NOT NULL REFERENCES actors(id),
        text TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'open',
        created_at TEXT NOT NULL
    );

    CREATE TABLE tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        suggestion_id TEXT REFERENCES suggestions(id),
        created_at TEXT NOT NULL
    );",
];

/// Applies all migrations newer than the database's current user_version.
pub fn run(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i64;
        if version <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        info!(version, "applied schema migration");
    }

    Ok(())
}
