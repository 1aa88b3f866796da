// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attendance day rows and conditional punch writes.

use chrono::{NaiveDate, NaiveTime};
use mordomo_core::MordomoError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{AttendanceRecord, PunchKind};
use crate::queries::parse_col;

fn map_record(row: &Row<'_>) -> Result<AttendanceRecord, rusqlite::Error> {
    let time_col = |idx: usize, raw: Option<String>| -> Result<Option<NaiveTime>, rusqlite::Error> {
        raw.map(|s| parse_col(idx, s)).transpose()
    };
    Ok(AttendanceRecord {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        date: parse_col(2, row.get(2)?)?,
        entrada: time_col(3, row.get(3)?)?,
        saida: time_col(4, row.get(4)?)?,
        lunch_out: time_col(5, row.get(5)?)?,
        lunch_return: time_col(6, row.get(6)?)?,
        missing_entrada: row.get::<_, i64>(7)? != 0,
    })
}

/// Returns the attendance row for actor+date, if any.
pub async fn find_day(
    db: &Database,
    actor_id: i64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, MordomoError> {
    let date = date.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, actor_id, date, entrada, saida, lunch_out, lunch_return,
                        missing_entrada
                 FROM attendance WHERE actor_id = ?1 AND date = ?2",
            )?;
            let mut rows = stmt.query_map(params![actor_id, date], map_record)?;
            let first = rows.next().transpose()?;
            Ok(first)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Writes a punch column for actor+date if it is currently unset, creating
/// the day row when needed. Returns `true` when the column was written.
///
/// The conditional UPDATE (`... AND <column> IS NULL`) is the idempotency
/// anchor for the no-duplicate-punch invariant; callers never pre-check and
/// write in separate transactions.
pub async fn set_punch(
    db: &Database,
    actor_id: i64,
    date: NaiveDate,
    punch: PunchKind,
    time: NaiveTime,
    missing_entrada: bool,
) -> Result<bool, MordomoError> {
    let date = date.to_string();
    let time = time.format("%H:%M:%S").to_string();

    // Column names are fixed per punch kind; the SQL is fully static.
    let update_sql = match punch {
        PunchKind::Entrada => {
            "UPDATE attendance SET entrada = ?3,
                 missing_entrada = CASE WHEN ?4 != 0 THEN 1 ELSE missing_entrada END
             WHERE actor_id = ?1 AND date = ?2 AND entrada IS NULL"
        }
        PunchKind::Saida => {
            "UPDATE attendance SET saida = ?3,
                 missing_entrada = CASE WHEN ?4 != 0 THEN 1 ELSE missing_entrada END
             WHERE actor_id = ?1 AND date = ?2 AND saida IS NULL"
        }
        PunchKind::LunchOut => {
            "UPDATE attendance SET lunch_out = ?3,
                 missing_entrada = CASE WHEN ?4 != 0 THEN 1 ELSE missing_entrada END
             WHERE actor_id = ?1 AND date = ?2 AND lunch_out IS NULL"
        }
        PunchKind::LunchReturn => {
            "UPDATE attendance SET lunch_return = ?3,
                 missing_entrada = CASE WHEN ?4 != 0 THEN 1 ELSE missing_entrada END
             WHERE actor_id = ?1 AND date = ?2 AND lunch_return IS NULL"
        }
    };

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO attendance (actor_id, date) VALUES (?1, ?2)
                 ON CONFLICT(actor_id, date) DO NOTHING",
                params![actor_id, date],
            )?;
            let changed = tx.execute(
                update_sql,
                params![actor_id, date, time, missing_entrada as i64],
            )?;
            tx.commit()?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("att.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn first_entrada_writes_second_is_noop() {
        let (db, _dir) = setup_db().await;

        let wrote = set_punch(&db, 0, d("2026-03-02"), PunchKind::Entrada, t("08:00:00"), false)
            .await
            .unwrap();
        assert!(wrote);

        let wrote_again =
            set_punch(&db, 0, d("2026-03-02"), PunchKind::Entrada, t("09:15:00"), false)
                .await
                .unwrap();
        assert!(!wrote_again, "second entrada for same day must be a no-op");

        let day = find_day(&db, 0, d("2026-03-02")).await.unwrap().unwrap();
        assert_eq!(day.entrada, Some(t("08:00:00")), "first time must survive");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn saida_without_entrada_sets_missing_flag() {
        let (db, _dir) = setup_db().await;

        let wrote = set_punch(&db, 0, d("2026-03-02"), PunchKind::Saida, t("17:00:00"), true)
            .await
            .unwrap();
        assert!(wrote);

        let day = find_day(&db, 0, d("2026-03-02")).await.unwrap().unwrap();
        assert_eq!(day.saida, Some(t("17:00:00")));
        assert!(day.entrada.is_none());
        assert!(day.missing_entrada);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn punches_on_different_dates_are_independent() {
        let (db, _dir) = setup_db().await;

        assert!(
            set_punch(&db, 0, d("2026-03-02"), PunchKind::Entrada, t("08:00:00"), false)
                .await
                .unwrap()
        );
        assert!(
            set_punch(&db, 0, d("2026-03-03"), PunchKind::Entrada, t("08:05:00"), false)
                .await
                .unwrap()
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn lunch_columns_are_scoped_separately() {
        let (db, _dir) = setup_db().await;

        assert!(
            set_punch(&db, 0, d("2026-03-02"), PunchKind::LunchOut, t("12:00:00"), false)
                .await
                .unwrap()
        );
        assert!(
            set_punch(&db, 0, d("2026-03-02"), PunchKind::LunchReturn, t("13:00:00"), false)
                .await
                .unwrap()
        );
        assert!(
            !set_punch(&db, 0, d("2026-03-02"), PunchKind::LunchOut, t("14:00:00"), false)
                .await
                .unwrap()
        );

        let day = find_day(&db, 0, d("2026-03-02")).await.unwrap().unwrap();
        assert_eq!(day.lunch_out, Some(t("12:00:00")));
        assert_eq!(day.lunch_return, Some(t("13:00:00")));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_day_returns_none_for_absent_row() {
        let (db, _dir) = setup_db().await;
        assert!(find_day(&db, 0, d("2026-03-02")).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
