// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use mordomo_core::MordomoError;
use tracing::debug;

use crate::migrations;

/// Handle to the single serialized SQLite connection.
pub struct Database {
    connection: tokio_rusqlite::Connection,
}

/// Maps a tokio-rusqlite error into the storage error variant.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> MordomoError {
    MordomoError::Storage {
        source: Box::new(err),
    }
}

impl Database {
    /// Opens (or creates) the database at `path`, applies PRAGMAs, and runs
    /// schema migrations.
    pub async fn open(path: &str) -> Result<Self, MordomoError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MordomoError::Storage {
                source: Box::new(e),
            })?;
        }

        let connection = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| MordomoError::Storage {
                source: Box::new(e),
            })?;

        connection
            .call(|conn| {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;
                     PRAGMA foreign_keys = ON;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        connection
            .call(|conn| {
                migrations::run(conn)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(path = %path, "database opened");
        Ok(Self { connection })
    }

    /// Returns the shared serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.connection
    }

    /// Checkpoints the WAL and releases the connection.
    pub async fn close(&self) -> Result<(), MordomoError> {
        self.connection
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
