// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mordomo pipeline.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a channel message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// The reserved actor id for senders that could not be resolved.
pub const UNKNOWN_ACTOR_ID: i64 = 0;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind the [`crate::traits::PluginAdapter`] base trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Channel,
    Classifier,
    Storage,
    Alert,
}

// --- Actors ---

/// A household member (or the unknown sender, id 0) identified in the chat channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    /// Normalized phone number (digits only), if known.
    pub phone: Option<String>,
    pub role: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to auto-create an actor from a chat identity.
#[derive(Debug, Clone)]
pub struct NewActor {
    pub name: String,
    pub phone: Option<String>,
}

// --- Channel messages ---

/// Media attached to an inbound channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
}

/// Reference to a media object held by the channel (downloaded on demand).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Channel-side media id or URL.
    pub id: String,
    pub mime: String,
}

/// Immutable record of one inbound channel event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel message id, used for de-duplication across re-deliveries.
    pub id: String,
    pub chat_id: String,
    /// Sender phone as reported by the channel (pre-normalization).
    pub sender_phone: String,
    pub sender_name: String,
    pub text: String,
    pub media: Option<MediaRef>,
    /// Original send time. Differs from processing time when a missed
    /// message is replayed after an outage.
    pub timestamp: DateTime<Utc>,
    /// Replay mode: apply without asking for confirmation and without
    /// per-message acknowledgments.
    pub silent: bool,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub text: String,
    /// Channel message id this is a reply to, when the channel supports it.
    pub reply_to: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_images: bool,
    pub supports_voice: bool,
    pub supports_documents: bool,
    pub max_message_length: Option<usize>,
}

// --- Classification ---

/// The classified purpose of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Entrada,
    Saida,
    SaidaAlmoco,
    RetornoAlmoco,
    Document,
    Delivery,
    Invoice,
    Receipt,
    Suggestion,
    None,
}

impl IntentKind {
    /// Whether this intent is a time-clock punch.
    pub fn is_punch(self) -> bool {
        matches!(
            self,
            IntentKind::Entrada
                | IntentKind::Saida
                | IntentKind::SaidaAlmoco
                | IntentKind::RetornoAlmoco
        )
    }

    /// The attendance punch this intent maps to, if any.
    pub fn as_punch(self) -> Option<PunchKind> {
        match self {
            IntentKind::Entrada => Some(PunchKind::Entrada),
            IntentKind::Saida => Some(PunchKind::Saida),
            IntentKind::SaidaAlmoco => Some(PunchKind::LunchOut),
            IntentKind::RetornoAlmoco => Some(PunchKind::LunchReturn),
            _ => None,
        }
    }
}

/// How the classifier response was obtained.
///
/// The external service sometimes returns near-miss text instead of the
/// expected structure; `FallbackParsed` marks results recovered by the
/// permissive extractor so downstream code can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Structured,
    FallbackParsed,
    Empty,
}

/// Output of the classifier for a given inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    pub kind: IntentKind,
    /// Confidence score in [0, 100].
    pub confidence: u8,
    /// Time named in the message, when present ("cheguei às 8:30").
    pub explicit_time: Option<NaiveTime>,
    pub extracted: Option<ExtractedFields>,
    pub source: ClassificationSource,
}

impl ClassifiedIntent {
    /// The no-intent result used for empty, failed, or unusable classifications.
    pub fn none() -> Self {
        Self {
            kind: IntentKind::None,
            confidence: 0,
            explicit_time: None,
            extracted: None,
            source: ClassificationSource::Empty,
        }
    }
}

/// Request passed to the intent classifier.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest {
    pub text: String,
    pub media_kind: Option<MediaKind>,
    pub sender_name: String,
    /// Known household actor names, for sender disambiguation in prompts.
    pub known_actors: Vec<String>,
    /// Recent conversation lines for this chat, oldest first.
    pub context: Vec<String>,
}

/// Structured fields extracted from document and invoice media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub doc_kind: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub items: Vec<ExtractedItem>,
    #[serde(default)]
    pub issued_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One line item extracted from an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
}

// --- Confirmations ---

/// Lifecycle status of a pending confirmation. Transitions are terminal:
/// `Pending` moves to exactly one of the other states and never back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Denied,
    Expired,
}

/// An open yes/no question awaiting the actor's reply before an effect is committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub id: String,
    pub actor_id: i64,
    pub kind: IntentKind,
    pub subject_date: NaiveDate,
    pub subject_time: Option<NaiveTime>,
    /// Serialized [`ConfirmationPayload`] carrying the context needed to
    /// apply the effect after the reply arrives.
    pub payload: String,
    pub status: ConfirmationStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Context captured at question time and replayed at apply time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationPayload {
    pub kind: IntentKind,
    pub chat_id: String,
    pub text: String,
    #[serde(default)]
    pub extracted: Option<ExtractedFields>,
    /// Suggestion staged when the question was asked, consumed or dismissed
    /// by the reply.
    #[serde(default)]
    pub suggestion_id: Option<String>,
}

// --- Domain records ---

/// One attendance punch column on the per-day record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    Entrada,
    Saida,
    LunchOut,
    LunchReturn,
}

/// One row per actor per calendar date holding the day's punches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub actor_id: i64,
    pub date: NaiveDate,
    pub entrada: Option<NaiveTime>,
    pub saida: Option<NaiveTime>,
    pub lunch_out: Option<NaiveTime>,
    pub lunch_return: Option<NaiveTime>,
    /// Set when a saida was recorded with no matching open entrada.
    pub missing_entrada: bool,
}

impl AttendanceRecord {
    /// The recorded time for a given punch column.
    pub fn punch(&self, kind: PunchKind) -> Option<NaiveTime> {
        match kind {
            PunchKind::Entrada => self.entrada,
            PunchKind::Saida => self.saida,
            PunchKind::LunchOut => self.lunch_out,
            PunchKind::LunchReturn => self.lunch_return,
        }
    }
}

/// A document (id card, work permit, certificate) attached to an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub actor_id: Option<i64>,
    pub doc_kind: Option<String>,
    pub number: Option<String>,
    pub issued_at: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A package or goods delivery logged at the house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: String,
    pub actor_id: Option<i64>,
    pub description: String,
    pub received_at: DateTime<Utc>,
}

/// Expense record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Invoice,
    Receipt,
}

/// An invoice or receipt expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub actor_id: Option<i64>,
    pub kind: ExpenseKind,
    pub vendor: Option<String>,
    pub total_cents: Option<i64>,
    /// Line items as JSON (array of [`ExtractedItem`]).
    pub items_json: Option<String>,
    pub incurred_at: DateTime<Utc>,
}

/// One item on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
    pub quantity: Option<f64>,
    pub purchased: bool,
}

/// Lifecycle status of a task suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Open,
    Consumed,
    Dismissed,
}

/// A free-form member suggestion captured for later triage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub actor_id: i64,
    pub text: String,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}

/// A task created from a confirmed suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub suggestion_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Operational alerting ---

/// Operational events forwarded to the operator alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum AlertEvent {
    ChannelDisconnected { reason: String },
    RetriesExhausted { attempts: u32 },
    HealthCheckFailed { detail: String },
    RateLimited { service: String },
}

impl std::fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertEvent::ChannelDisconnected { reason } => {
                write!(f, "channel disconnected: {reason}")
            }
            AlertEvent::RetriesExhausted { attempts } => {
                write!(f, "channel connect retries exhausted after {attempts} attempts")
            }
            AlertEvent::HealthCheckFailed { detail } => {
                write!(f, "health check failed: {detail}")
            }
            AlertEvent::RateLimited { service } => {
                write!(f, "rate limit reached for {service}")
            }
        }
    }
}
