// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Mordomo household agent.
//!
//! All writes flow through a single tokio-rusqlite connection (serialized on
//! its background thread) with WAL mode enabled, so per-key conditional
//! updates are atomic without application-side locking.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
