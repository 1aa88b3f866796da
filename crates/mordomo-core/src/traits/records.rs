// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain record store trait.
//!
//! Every domain mutation the resolver performs goes through this narrow
//! create/find-by-natural-key surface; there are no ad hoc writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::MordomoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Actor, AttendanceRecord, ConfirmationStatus, DeliveryRecord, DocumentRecord, ExpenseRecord,
    NewActor, PendingConfirmation, PunchKind, ShoppingItem, Suggestion, SuggestionStatus,
    TaskRecord,
};

/// Persistence operations for household domain records.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Opens the backing store and applies pending schema migrations.
    async fn initialize(&self) -> Result<(), MordomoError>;

    /// Flushes and closes the backing store.
    async fn close(&self) -> Result<(), MordomoError>;

    // --- Actor operations ---

    /// Looks up an actor by normalized phone number (digits only).
    async fn find_actor_by_phone(&self, phone: &str) -> Result<Option<Actor>, MordomoError>;

    /// Looks up an actor by folded display name (lowercased, diacritics stripped).
    async fn find_actor_by_name(&self, folded_name: &str) -> Result<Option<Actor>, MordomoError>;

    async fn get_actor(&self, id: i64) -> Result<Option<Actor>, MordomoError>;

    /// Creates an actor from a chat identity and returns it.
    async fn create_actor(&self, actor: &NewActor) -> Result<Actor, MordomoError>;

    /// Names of all active actors, for classifier prompts.
    async fn list_actor_names(&self) -> Result<Vec<String>, MordomoError>;

    // --- Message de-duplication ---

    /// Records a channel message id. Returns `false` when the id was already
    /// seen, in which case the message must be skipped entirely.
    async fn mark_processed(&self, channel_message_id: &str) -> Result<bool, MordomoError>;

    // --- Attendance operations ---

    /// Returns the attendance row for an actor and calendar date, if any.
    async fn find_day(
        &self,
        actor_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, MordomoError>;

    /// Writes a punch column for actor+date if it is currently unset,
    /// creating the day row when needed. Returns `true` when the column was
    /// written, `false` when a value already existed (no-op).
    async fn set_punch(
        &self,
        actor_id: i64,
        date: NaiveDate,
        punch: PunchKind,
        time: NaiveTime,
        missing_entrada: bool,
    ) -> Result<bool, MordomoError>;

    // --- Confirmation operations ---

    /// Atomically expires any pending confirmation for the same actor, then
    /// inserts the new pending row. Callers never observe two simultaneously
    /// pending entries for one actor.
    async fn supersede_and_insert_confirmation(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<(), MordomoError>;

    /// Returns the single pending confirmation for an actor, if any.
    async fn get_pending_confirmation(
        &self,
        actor_id: i64,
    ) -> Result<Option<PendingConfirmation>, MordomoError>;

    /// Transitions a confirmation out of `pending`. Returns `false` if the
    /// row was not pending (already resolved or expired).
    async fn resolve_confirmation(
        &self,
        id: &str,
        status: ConfirmationStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, MordomoError>;

    /// Expires all pending confirmations created before the cutoff.
    /// Returns the number of rows transitioned.
    async fn expire_confirmations_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, MordomoError>;

    // --- Document / delivery / expense operations ---

    async fn insert_document(&self, doc: &DocumentRecord) -> Result<(), MordomoError>;

    async fn insert_delivery(&self, delivery: &DeliveryRecord) -> Result<(), MordomoError>;

    async fn insert_expense(&self, expense: &ExpenseRecord) -> Result<(), MordomoError>;

    // --- Shopping operations ---

    /// Unpurchased items on open shopping lists.
    async fn open_shopping_items(&self) -> Result<Vec<ShoppingItem>, MordomoError>;

    async fn mark_item_purchased(&self, item_id: i64) -> Result<(), MordomoError>;

    // --- Suggestion and task operations ---

    async fn insert_suggestion(&self, suggestion: &Suggestion) -> Result<(), MordomoError>;

    async fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, MordomoError>;

    /// Returns `false` if the suggestion does not exist.
    async fn set_suggestion_status(
        &self,
        id: &str,
        status: SuggestionStatus,
    ) -> Result<bool, MordomoError>;

    async fn insert_task(&self, task: &TaskRecord) -> Result<(), MordomoError>;
}
