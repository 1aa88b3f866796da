// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use mordomo_config::model::StorageConfig;
use mordomo_core::types::{
    Actor, AttendanceRecord, ConfirmationStatus, DeliveryRecord, DocumentRecord, ExpenseRecord,
    NewActor, PendingConfirmation, PunchKind, ShoppingItem, Suggestion, SuggestionStatus,
    TaskRecord,
};
use mordomo_core::{AdapterType, HealthStatus, MordomoError, PluginAdapter, RecordStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed record store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`RecordStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`RecordStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, MordomoError> {
        self.db.get().ok_or_else(|| MordomoError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MordomoError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MordomoError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn initialize(&self) -> Result<(), MordomoError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| MordomoError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MordomoError> {
        self.db()?.close().await
    }

    // --- Actor operations ---

    async fn find_actor_by_phone(&self, phone: &str) -> Result<Option<Actor>, MordomoError> {
        queries::actors::find_by_phone(self.db()?, phone).await
    }

    async fn find_actor_by_name(&self, folded_name: &str) -> Result<Option<Actor>, MordomoError> {
        queries::actors::find_by_name(self.db()?, folded_name).await
    }

    async fn get_actor(&self, id: i64) -> Result<Option<Actor>, MordomoError> {
        queries::actors::get(self.db()?, id).await
    }

    async fn create_actor(&self, actor: &NewActor) -> Result<Actor, MordomoError> {
        queries::actors::create(self.db()?, actor).await
    }

    async fn list_actor_names(&self) -> Result<Vec<String>, MordomoError> {
        queries::actors::list_names(self.db()?).await
    }

    // --- Message de-duplication ---

    async fn mark_processed(&self, channel_message_id: &str) -> Result<bool, MordomoError> {
        queries::processed::mark(self.db()?, channel_message_id).await
    }

    // --- Attendance operations ---

    async fn find_day(
        &self,
        actor_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, MordomoError> {
        queries::attendance::find_day(self.db()?, actor_id, date).await
    }

    async fn set_punch(
        &self,
        actor_id: i64,
        date: NaiveDate,
        punch: PunchKind,
        time: NaiveTime,
        missing_entrada: bool,
    ) -> Result<bool, MordomoError> {
        queries::attendance::set_punch(self.db()?, actor_id, date, punch, time, missing_entrada)
            .await
    }

    // --- Confirmation operations ---

    async fn supersede_and_insert_confirmation(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<(), MordomoError> {
        queries::confirmations::supersede_and_insert(self.db()?, confirmation).await
    }

    async fn get_pending_confirmation(
        &self,
        actor_id: i64,
    ) -> Result<Option<PendingConfirmation>, MordomoError> {
        queries::confirmations::get_pending(self.db()?, actor_id).await
    }

    async fn resolve_confirmation(
        &self,
        id: &str,
        status: ConfirmationStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, MordomoError> {
        queries::confirmations::resolve(self.db()?, id, status, resolved_at).await
    }

    async fn expire_confirmations_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, MordomoError> {
        queries::confirmations::expire_before(self.db()?, cutoff).await
    }

    // --- Document / delivery / expense operations ---

    async fn insert_document(&self, doc: &DocumentRecord) -> Result<(), MordomoError> {
        queries::records::insert_document(self.db()?, doc).await
    }

    async fn insert_delivery(&self, delivery: &DeliveryRecord) -> Result<(), MordomoError> {
        queries::records::insert_delivery(self.db()?, delivery).await
    }

    async fn insert_expense(&self, expense: &ExpenseRecord) -> Result<(), MordomoError> {
        queries::records::insert_expense(self.db()?, expense).await
    }

    // --- Shopping operations ---

    async fn open_shopping_items(&self) -> Result<Vec<ShoppingItem>, MordomoError> {
        queries::shopping::open_items(self.db()?).await
    }

    async fn mark_item_purchased(&self, item_id: i64) -> Result<(), MordomoError> {
        queries::shopping::mark_purchased(self.db()?, item_id).await
    }

    // --- Suggestion and task operations ---

    async fn insert_suggestion(&self, suggestion: &Suggestion) -> Result<(), MordomoError> {
        queries::suggestions::insert(self.db()?, suggestion).await
    }

    async fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, MordomoError> {
        queries::suggestions::get(self.db()?, id).await
    }

    async fn set_suggestion_status(
        &self,
        id: &str,
        status: SuggestionStatus,
    ) -> Result<bool, MordomoError> {
        queries::suggestions::set_status(self.db()?, id, status).await
    }

    async fn insert_task(&self, task: &TaskRecord) -> Result<(), MordomoError> {
        queries::suggestions::insert_task(self.db()?, task).await
    }
}
