// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suggestion and task rows.

use mordomo_core::MordomoError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{Suggestion, SuggestionStatus, TaskRecord};
use crate::queries::{fmt_ts, parse_col};

fn map_suggestion(row: &Row<'_>) -> Result<Suggestion, rusqlite::Error> {
    Ok(Suggestion {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        text: row.get(2)?,
        status: parse_col(3, row.get(3)?)?,
        created_at: parse_col(4, row.get(4)?)?,
    })
}

/// Inserts a suggestion.
pub async fn insert(db: &Database, suggestion: &Suggestion) -> Result<(), MordomoError> {
    let s = suggestion.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO suggestions (id, actor_id, text, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![s.id, s.actor_id, s.text, s.status.to_string(), fmt_ts(s.created_at)],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetches a suggestion by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<Suggestion>, MordomoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, actor_id, text, status, created_at FROM suggestions WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id], map_suggestion)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Updates a suggestion's status. Returns `false` if the row does not exist.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: SuggestionStatus,
) -> Result<bool, MordomoError> {
    let id = id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE suggestions SET status = ?2 WHERE id = ?1",
                params![id, status],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts a task created from a confirmed suggestion.
pub async fn insert_task(db: &Database, task: &TaskRecord) -> Result<(), MordomoError> {
    let t = task.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, suggestion_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![t.id, t.title, t.suggestion_id, fmt_ts(t.created_at)],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn make_suggestion(id: &str) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            actor_id: 0,
            text: "a mangueira do jardim está furada".to_string(),
            status: SuggestionStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_get_and_transition() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("sug.db").to_str().unwrap())
            .await
            .unwrap();

        insert(&db, &make_suggestion("s1")).await.unwrap();
        let fetched = get(&db, "s1").await.unwrap().unwrap();
        assert_eq!(fetched.status, SuggestionStatus::Open);

        assert!(set_status(&db, "s1", SuggestionStatus::Consumed).await.unwrap());
        assert_eq!(
            get(&db, "s1").await.unwrap().unwrap().status,
            SuggestionStatus::Consumed
        );

        assert!(!set_status(&db, "missing", SuggestionStatus::Dismissed).await.unwrap());

        insert_task(
            &db,
            &TaskRecord {
                id: "t1".into(),
                title: "consertar mangueira".into(),
                suggestion_id: Some("s1".into()),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        db.close().await.unwrap();
    }
}
