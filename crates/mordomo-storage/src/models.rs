// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `mordomo-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use mordomo_core::types::{
    Actor, AttendanceRecord, ConfirmationStatus, DeliveryRecord, DocumentRecord, ExpenseKind,
    ExpenseRecord, NewActor, PendingConfirmation, PunchKind, ShoppingItem, Suggestion,
    SuggestionStatus, TaskRecord,
};
