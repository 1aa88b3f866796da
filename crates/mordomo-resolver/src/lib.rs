// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action resolver for the Mordomo household agent.
//!
//! Turns a classified intent (auto-apply path) or a resolved pending
//! confirmation into exactly one idempotent effect against the record store,
//! returning the single acknowledgment the router sends back. Every effect
//! checks existing state before writing; replaying an input never produces a
//! second domain record.
//!
//! The apply-at-most-once guarantee for confirmations is keyed by the
//! confirmation id: the router only calls [`ActionResolver::apply_confirmed`]
//! after the store's pending -> confirmed transition succeeded, never by
//! replaying payload content.

pub mod reconcile;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mordomo_core::text::fold_text;
use mordomo_core::types::{
    Actor, ConfirmationPayload, DeliveryRecord, DocumentRecord, ExpenseKind, ExpenseRecord,
    ExtractedFields, IntentKind, NewActor, PendingConfirmation, PunchKind, Suggestion,
    SuggestionStatus, TaskRecord, UNKNOWN_ACTOR_ID,
};
use mordomo_core::{MordomoError, RecordStore};
use tracing::{debug, info, warn};

/// Result of applying one effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// The single acknowledgment to send back to the chat.
    pub ack: String,
    /// Whether a domain record was written (false for idempotent no-ops and
    /// denials).
    pub wrote: bool,
}

/// Context shared by every auto-apply effect.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub actor: &'a Actor,
    /// Household-local calendar date the effect belongs to.
    pub date: NaiveDate,
    /// Household-local time of the punch (explicit time or message time).
    pub time: NaiveTime,
    /// Instant used for record timestamps.
    pub at: DateTime<Utc>,
    pub text: &'a str,
    pub extracted: Option<&'a ExtractedFields>,
}

/// Applies intents and confirmations as idempotent domain effects.
pub struct ActionResolver {
    records: Arc<dyn RecordStore>,
}

impl ActionResolver {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Applies a classified intent directly (the auto-apply path).
    pub async fn apply_intent(
        &self,
        kind: IntentKind,
        ctx: &EffectContext<'_>,
    ) -> Result<Applied, MordomoError> {
        match kind {
            IntentKind::Entrada
            | IntentKind::Saida
            | IntentKind::SaidaAlmoco
            | IntentKind::RetornoAlmoco => {
                let punch = kind
                    .as_punch()
                    .ok_or_else(|| MordomoError::Internal("punch mapping missing".into()))?;
                self.apply_punch(ctx.actor.id, punch, ctx.date, ctx.time).await
            }
            IntentKind::Document => self.apply_document(ctx.actor, ctx.text, ctx.extracted, ctx.at).await,
            IntentKind::Delivery => self.apply_delivery(ctx.actor, ctx.text, ctx.extracted, ctx.at).await,
            IntentKind::Invoice => {
                self.apply_expense(ExpenseKind::Invoice, ctx.actor, ctx.extracted, ctx.at).await
            }
            IntentKind::Receipt => {
                self.apply_expense(ExpenseKind::Receipt, ctx.actor, ctx.extracted, ctx.at).await
            }
            IntentKind::Suggestion => {
                let suggestion = self.stage_suggestion(ctx.actor.id, ctx.text).await?;
                Ok(Applied {
                    ack: format!("Sugestão anotada: {}.", suggestion.text),
                    wrote: true,
                })
            }
            IntentKind::None => Err(MordomoError::Internal(
                "apply_intent called with no intent".into(),
            )),
        }
    }

    /// Applies a confirmed pending confirmation.
    ///
    /// Must only be called after the pending -> confirmed transition
    /// succeeded; that transition is the apply-once gate.
    pub async fn apply_confirmed(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<Applied, MordomoError> {
        let payload = decode_payload(confirmation)?;
        let actor = self.actor_for(confirmation.actor_id).await?;
        let at = Utc::now();

        match payload.kind {
            IntentKind::Entrada
            | IntentKind::Saida
            | IntentKind::SaidaAlmoco
            | IntentKind::RetornoAlmoco => {
                let punch = payload
                    .kind
                    .as_punch()
                    .ok_or_else(|| MordomoError::Internal("punch mapping missing".into()))?;
                let time = confirmation.subject_time.ok_or_else(|| {
                    MordomoError::Internal("confirmed punch without subject time".into())
                })?;
                self.apply_punch(confirmation.actor_id, punch, confirmation.subject_date, time)
                    .await
            }
            IntentKind::Document => {
                self.apply_document(&actor, &payload.text, payload.extracted.as_ref(), at).await
            }
            IntentKind::Delivery => {
                self.apply_delivery(&actor, &payload.text, payload.extracted.as_ref(), at).await
            }
            IntentKind::Invoice => {
                self.apply_expense(ExpenseKind::Invoice, &actor, payload.extracted.as_ref(), at)
                    .await
            }
            IntentKind::Receipt => {
                self.apply_expense(ExpenseKind::Receipt, &actor, payload.extracted.as_ref(), at)
                    .await
            }
            IntentKind::Suggestion => self.consume_suggestion(&payload).await,
            IntentKind::None => Err(MordomoError::Internal(
                "confirmation carried no applicable kind".into(),
            )),
        }
    }

    /// Handles a denied pending confirmation.
    ///
    /// A denied suggestion is archived (dismissed); a denied attendance or
    /// record confirmation is only acknowledged. The asymmetry is business
    /// policy, not an accident.
    pub async fn apply_denied(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<Applied, MordomoError> {
        let payload = decode_payload(confirmation)?;

        if payload.kind == IntentKind::Suggestion {
            if let Some(ref suggestion_id) = payload.suggestion_id {
                if !self
                    .records
                    .set_suggestion_status(suggestion_id, SuggestionStatus::Dismissed)
                    .await?
                {
                    warn!(suggestion_id = %suggestion_id, "denied suggestion no longer exists");
                }
            }
            return Ok(Applied {
                ack: "Sem problema, sugestão descartada.".to_string(),
                wrote: false,
            });
        }

        debug!(
            confirmation_id = %confirmation.id,
            kind = %payload.kind,
            "confirmation denied, nothing recorded"
        );
        Ok(Applied {
            ack: "Ok, nada foi registrado.".to_string(),
            wrote: false,
        })
    }

    /// Creates an open suggestion record. Used both for the classified
    /// `suggestion` kind and as the low-confidence fallback target.
    pub async fn stage_suggestion(
        &self,
        actor_id: i64,
        text: &str,
    ) -> Result<Suggestion, MordomoError> {
        let suggestion = Suggestion {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id,
            text: text.trim().to_string(),
            status: SuggestionStatus::Open,
            created_at: Utc::now(),
        };
        self.records.insert_suggestion(&suggestion).await?;
        info!(actor_id, suggestion_id = %suggestion.id, "suggestion recorded");
        Ok(suggestion)
    }

    /// Routes substantive low-confidence text to the suggestion fallback:
    /// meaningful input is never silently dropped.
    pub async fn suggestion_fallback(
        &self,
        actor_id: i64,
        text: &str,
    ) -> Result<Applied, MordomoError> {
        self.stage_suggestion(actor_id, text).await?;
        Ok(Applied {
            ack: "Não identifiquei um registro de ponto. Anotei como sugestão para a casa."
                .to_string(),
            wrote: true,
        })
    }

    // --- Punches ---

    async fn apply_punch(
        &self,
        actor_id: i64,
        punch: PunchKind,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Applied, MordomoError> {
        let day = self.records.find_day(actor_id, date).await?;

        if let Some(existing) = day.as_ref().and_then(|d| d.punch(punch)) {
            debug!(actor_id, punch = %punch, "punch already registered, acknowledging");
            return Ok(Applied {
                ack: already_ack(punch, existing),
                wrote: false,
            });
        }

        // A saida with no entrada on the day still writes, flagged.
        let missing_entrada =
            punch == PunchKind::Saida && day.as_ref().is_none_or(|d| d.entrada.is_none());

        let wrote = self
            .records
            .set_punch(actor_id, date, punch, time, missing_entrada)
            .await?;

        if !wrote {
            // Lost a write race within the day row; report what is there now.
            let current = self
                .records
                .find_day(actor_id, date)
                .await?
                .and_then(|d| d.punch(punch))
                .unwrap_or(time);
            return Ok(Applied {
                ack: already_ack(punch, current),
                wrote: false,
            });
        }

        info!(actor_id, punch = %punch, date = %date, time = %time, "punch recorded");
        Ok(Applied {
            ack: punch_ack(punch, time, missing_entrada),
            wrote: true,
        })
    }

    // --- Documents ---

    async fn apply_document(
        &self,
        sender: &Actor,
        text: &str,
        extracted: Option<&ExtractedFields>,
        at: DateTime<Utc>,
    ) -> Result<Applied, MordomoError> {
        let ext = extracted.cloned().unwrap_or_default();

        // Match the document's owner by extracted identifier fields, falling
        // back to a minimal auto-created actor, then to the sender.
        let owner = if let Some(name) = ext.person_name.as_deref().filter(|n| !n.trim().is_empty())
        {
            match self.records.find_actor_by_name(&fold_text(name)).await? {
                Some(actor) => actor,
                None => {
                    let actor = self
                        .records
                        .create_actor(&NewActor {
                            name: name.trim().to_string(),
                            phone: None,
                        })
                        .await?;
                    info!(actor_id = actor.id, "created minimal actor from document fields");
                    actor
                }
            }
        } else {
            sender.clone()
        };

        let doc = DocumentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: Some(owner.id),
            doc_kind: ext.doc_kind.clone(),
            number: ext.document_number.clone(),
            issued_at: ext.issued_at.clone(),
            notes: ext
                .notes
                .clone()
                .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string())),
            created_at: at,
        };
        self.records.insert_document(&doc).await?;

        let ack = match &doc.number {
            Some(number) => format!("Documento registrado para {} (nº {number}).", owner.name),
            None => format!("Documento registrado para {}.", owner.name),
        };
        Ok(Applied { ack, wrote: true })
    }

    // --- Deliveries ---

    async fn apply_delivery(
        &self,
        sender: &Actor,
        text: &str,
        extracted: Option<&ExtractedFields>,
        at: DateTime<Utc>,
    ) -> Result<Applied, MordomoError> {
        let description = extracted
            .and_then(|e| e.notes.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    "entrega recebida".to_string()
                } else {
                    text.trim().to_string()
                }
            });

        let delivery = DeliveryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: (sender.id != UNKNOWN_ACTOR_ID).then_some(sender.id),
            description: description.clone(),
            received_at: at,
        };
        self.records.insert_delivery(&delivery).await?;

        Ok(Applied {
            ack: format!("Entrega registrada: {description}."),
            wrote: true,
        })
    }

    // --- Expenses ---

    async fn apply_expense(
        &self,
        kind: ExpenseKind,
        sender: &Actor,
        extracted: Option<&ExtractedFields>,
        at: DateTime<Utc>,
    ) -> Result<Applied, MordomoError> {
        let ext = extracted.cloned().unwrap_or_default();

        let items_json = (!ext.items.is_empty())
            .then(|| serde_json::to_string(&ext.items))
            .transpose()
            .map_err(|e| MordomoError::Internal(format!("items serialization: {e}")))?;

        let expense = ExpenseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: (sender.id != UNKNOWN_ACTOR_ID).then_some(sender.id),
            kind,
            vendor: ext.vendor.clone(),
            total_cents: ext.total_cents,
            items_json,
            incurred_at: at,
        };
        self.records.insert_expense(&expense).await?;

        let label = match kind {
            ExpenseKind::Invoice => "Nota fiscal registrada",
            ExpenseKind::Receipt => "Recibo registrado",
        };
        let mut ack = match &ext.vendor {
            Some(vendor) => format!("{label} ({vendor})."),
            None => format!("{label}."),
        };

        // Invoices reconcile line items against the open shopping list.
        if kind == ExpenseKind::Invoice && !ext.items.is_empty() {
            let open = self.records.open_shopping_items().await?;
            let matched = reconcile::match_items(&ext.items, &open);
            for item_id in &matched {
                self.records.mark_item_purchased(*item_id).await?;
            }
            if !matched.is_empty() {
                ack.push_str(&format!(
                    " {} itens da lista de compras marcados como comprados.",
                    matched.len()
                ));
            }
        }

        Ok(Applied { ack, wrote: true })
    }

    // --- Suggestions ---

    async fn consume_suggestion(
        &self,
        payload: &ConfirmationPayload,
    ) -> Result<Applied, MordomoError> {
        let title = match &payload.suggestion_id {
            Some(id) => match self.records.get_suggestion(id).await? {
                Some(suggestion) => suggestion.text,
                None => {
                    warn!(suggestion_id = %id, "staged suggestion missing, using payload text");
                    payload.text.clone()
                }
            },
            None => payload.text.clone(),
        };

        let task = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.clone(),
            suggestion_id: payload.suggestion_id.clone(),
            created_at: Utc::now(),
        };
        self.records.insert_task(&task).await?;

        if let Some(ref id) = payload.suggestion_id {
            self.records
                .set_suggestion_status(id, SuggestionStatus::Consumed)
                .await?;
        }

        info!(task_id = %task.id, "suggestion converted into task");
        Ok(Applied {
            ack: format!("Combinado! Tarefa criada: {title}."),
            wrote: true,
        })
    }

    async fn actor_for(&self, actor_id: i64) -> Result<Actor, MordomoError> {
        self.records
            .get_actor(actor_id)
            .await?
            .ok_or_else(|| MordomoError::Internal(format!("actor {actor_id} not found")))
    }
}

fn decode_payload(confirmation: &PendingConfirmation) -> Result<ConfirmationPayload, MordomoError> {
    serde_json::from_str(&confirmation.payload)
        .map_err(|e| MordomoError::Internal(format!("payload deserialization: {e}")))
}

fn punch_ack(punch: PunchKind, time: NaiveTime, missing_entrada: bool) -> String {
    let hhmm = time.format("%H:%M");
    match punch {
        PunchKind::Entrada => format!("Entrada registrada às {hhmm}."),
        PunchKind::Saida if missing_entrada => {
            format!("Saída registrada às {hhmm} (sem entrada correspondente hoje).")
        }
        PunchKind::Saida => format!("Saída registrada às {hhmm}."),
        PunchKind::LunchOut => format!("Saída para almoço registrada às {hhmm}."),
        PunchKind::LunchReturn => format!("Retorno do almoço registrado às {hhmm}."),
    }
}

fn already_ack(punch: PunchKind, existing: NaiveTime) -> String {
    let hhmm = existing.format("%H:%M");
    match punch {
        PunchKind::Entrada => format!("Entrada já registrada hoje às {hhmm}."),
        PunchKind::Saida => format!("Saída já registrada hoje às {hhmm}."),
        PunchKind::LunchOut => format!("Saída para almoço já registrada hoje às {hhmm}."),
        PunchKind::LunchReturn => format!("Retorno do almoço já registrado hoje às {hhmm}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mordomo_config::model::StorageConfig;
    use mordomo_core::types::{ConfirmationStatus, ExtractedItem};
    use mordomo_storage::{queries, SqliteStore};
    use tempfile::tempdir;

    struct Fixture {
        records: Arc<SqliteStore>,
        resolver: ActionResolver,
        _dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(StorageConfig {
            database_path: dir.path().join("resolver.db").to_str().unwrap().to_string(),
            wal_mode: true,
        });
        store.initialize().await.unwrap();
        let records = Arc::new(store);
        let resolver = ActionResolver::new(records.clone() as Arc<dyn RecordStore>);
        Fixture {
            records,
            resolver,
            _dir: dir,
        }
    }

    fn unknown_actor() -> Actor {
        Actor {
            id: UNKNOWN_ACTOR_ID,
            name: "unknown".to_string(),
            phone: None,
            role: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn ctx<'a>(actor: &'a Actor, time: &str) -> EffectContext<'a> {
        EffectContext {
            actor,
            date: "2026-03-02".parse().unwrap(),
            time: time.parse().unwrap(),
            at: Utc::now(),
            text: "",
            extracted: None,
        }
    }

    #[tokio::test]
    async fn second_entrada_is_acknowledged_not_written() {
        let f = setup().await;
        let actor = unknown_actor();

        let first = f
            .resolver
            .apply_intent(IntentKind::Entrada, &ctx(&actor, "08:00:00"))
            .await
            .unwrap();
        assert!(first.wrote);
        assert_eq!(first.ack, "Entrada registrada às 08:00.");

        let second = f
            .resolver
            .apply_intent(IntentKind::Entrada, &ctx(&actor, "09:30:00"))
            .await
            .unwrap();
        assert!(!second.wrote);
        assert_eq!(second.ack, "Entrada já registrada hoje às 08:00.");
    }

    #[tokio::test]
    async fn saida_without_entrada_is_flagged() {
        let f = setup().await;
        let actor = unknown_actor();

        let applied = f
            .resolver
            .apply_intent(IntentKind::Saida, &ctx(&actor, "17:00:00"))
            .await
            .unwrap();
        assert!(applied.wrote);
        assert!(applied.ack.contains("sem entrada correspondente"));

        let day = f
            .records
            .find_day(actor.id, "2026-03-02".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(day.missing_entrada);
    }

    #[tokio::test]
    async fn saida_fills_open_entrada_without_flag() {
        let f = setup().await;
        let actor = unknown_actor();

        f.resolver
            .apply_intent(IntentKind::Entrada, &ctx(&actor, "08:00:00"))
            .await
            .unwrap();
        let applied = f
            .resolver
            .apply_intent(IntentKind::Saida, &ctx(&actor, "17:00:00"))
            .await
            .unwrap();
        assert_eq!(applied.ack, "Saída registrada às 17:00.");

        let day = f
            .records
            .find_day(actor.id, "2026-03-02".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!day.missing_entrada);
    }

    #[tokio::test]
    async fn document_creates_minimal_actor_when_unmatched() {
        let f = setup().await;
        let actor = unknown_actor();

        let extracted = ExtractedFields {
            person_name: Some("Carlos Pereira".to_string()),
            document_number: Some("12.345.678-9".to_string()),
            doc_kind: Some("rg".to_string()),
            ..Default::default()
        };
        let mut context = ctx(&actor, "10:00:00");
        context.extracted = Some(&extracted);

        let applied = f
            .resolver
            .apply_intent(IntentKind::Document, &context)
            .await
            .unwrap();
        assert!(applied.ack.contains("Carlos Pereira"));
        assert!(applied.ack.contains("12.345.678-9"));

        // The minimal actor now exists and is matched on a second document.
        let found = f
            .records
            .find_actor_by_name("carlos pereira")
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn invoice_reconciles_open_shopping_list() {
        let f = setup().await;
        let actor = unknown_actor();

        let db = f.records.db().unwrap();
        let list = queries::shopping::create_list(db).await.unwrap();
        queries::shopping::add_item(db, list, "arroz", None).await.unwrap();
        queries::shopping::add_item(db, list, "café", None).await.unwrap();
        queries::shopping::add_item(db, list, "sabão", None).await.unwrap();

        let extracted = ExtractedFields {
            vendor: Some("Mercado Azul".to_string()),
            total_cents: Some(15890),
            items: vec![
                ExtractedItem {
                    name: "Arroz Integral 5kg".to_string(),
                    quantity: Some(1.0),
                },
                ExtractedItem {
                    name: "Café torrado".to_string(),
                    quantity: Some(2.0),
                },
            ],
            ..Default::default()
        };
        let mut context = ctx(&actor, "10:00:00");
        context.extracted = Some(&extracted);

        let applied = f
            .resolver
            .apply_intent(IntentKind::Invoice, &context)
            .await
            .unwrap();
        assert!(applied.ack.contains("Mercado Azul"));
        assert!(applied.ack.contains("2 itens"));

        let remaining = f.records.open_shopping_items().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "sabão");
    }

    #[tokio::test]
    async fn confirmed_suggestion_becomes_task_and_is_consumed() {
        let f = setup().await;

        let suggestion = f
            .resolver
            .stage_suggestion(UNKNOWN_ACTOR_ID, "trocar a mangueira do jardim")
            .await
            .unwrap();

        let payload = ConfirmationPayload {
            kind: IntentKind::Suggestion,
            chat_id: "chat-1".to_string(),
            text: suggestion.text.clone(),
            extracted: None,
            suggestion_id: Some(suggestion.id.clone()),
        };
        let confirmation = PendingConfirmation {
            id: "conf-1".to_string(),
            actor_id: UNKNOWN_ACTOR_ID,
            kind: IntentKind::Suggestion,
            subject_date: "2026-03-02".parse().unwrap(),
            subject_time: None,
            payload: serde_json::to_string(&payload).unwrap(),
            status: ConfirmationStatus::Confirmed,
            created_at: Utc::now(),
            resolved_at: Some(Utc::now()),
        };

        let applied = f.resolver.apply_confirmed(&confirmation).await.unwrap();
        assert!(applied.ack.contains("Tarefa criada"));

        let stored = f.records.get_suggestion(&suggestion.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SuggestionStatus::Consumed);
    }

    #[tokio::test]
    async fn denied_suggestion_is_dismissed_but_denied_punch_only_acks() {
        let f = setup().await;

        let suggestion = f
            .resolver
            .stage_suggestion(UNKNOWN_ACTOR_ID, "pintar o muro")
            .await
            .unwrap();

        let suggestion_payload = ConfirmationPayload {
            kind: IntentKind::Suggestion,
            chat_id: "chat-1".to_string(),
            text: suggestion.text.clone(),
            extracted: None,
            suggestion_id: Some(suggestion.id.clone()),
        };
        let denied_suggestion = PendingConfirmation {
            id: "conf-s".to_string(),
            actor_id: UNKNOWN_ACTOR_ID,
            kind: IntentKind::Suggestion,
            subject_date: "2026-03-02".parse().unwrap(),
            subject_time: None,
            payload: serde_json::to_string(&suggestion_payload).unwrap(),
            status: ConfirmationStatus::Denied,
            created_at: Utc::now(),
            resolved_at: Some(Utc::now()),
        };
        f.resolver.apply_denied(&denied_suggestion).await.unwrap();
        assert_eq!(
            f.records.get_suggestion(&suggestion.id).await.unwrap().unwrap().status,
            SuggestionStatus::Dismissed
        );

        // Denied attendance: acknowledgment only, nothing written.
        let punch_payload = ConfirmationPayload {
            kind: IntentKind::Entrada,
            chat_id: "chat-1".to_string(),
            text: "cheguei às 8:30".to_string(),
            extracted: None,
            suggestion_id: None,
        };
        let denied_punch = PendingConfirmation {
            id: "conf-p".to_string(),
            actor_id: UNKNOWN_ACTOR_ID,
            kind: IntentKind::Entrada,
            subject_date: "2026-03-02".parse().unwrap(),
            subject_time: Some("08:30:00".parse().unwrap()),
            payload: serde_json::to_string(&punch_payload).unwrap(),
            status: ConfirmationStatus::Denied,
            created_at: Utc::now(),
            resolved_at: Some(Utc::now()),
        };
        let applied = f.resolver.apply_denied(&denied_punch).await.unwrap();
        assert!(!applied.wrote);
        assert!(f
            .records
            .find_day(UNKNOWN_ACTOR_ID, "2026-03-02".parse().unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn confirmed_punch_writes_subject_time() {
        let f = setup().await;

        let payload = ConfirmationPayload {
            kind: IntentKind::Entrada,
            chat_id: "chat-1".to_string(),
            text: "cheguei às 8:30".to_string(),
            extracted: None,
            suggestion_id: None,
        };
        let confirmation = PendingConfirmation {
            id: "conf-2".to_string(),
            actor_id: UNKNOWN_ACTOR_ID,
            kind: IntentKind::Entrada,
            subject_date: "2026-03-02".parse().unwrap(),
            subject_time: Some("08:30:00".parse().unwrap()),
            payload: serde_json::to_string(&payload).unwrap(),
            status: ConfirmationStatus::Confirmed,
            created_at: Utc::now(),
            resolved_at: Some(Utc::now()),
        };

        let applied = f.resolver.apply_confirmed(&confirmation).await.unwrap();
        assert_eq!(applied.ack, "Entrada registrada às 08:30.");

        let day = f
            .records
            .find_day(UNKNOWN_ACTOR_ID, "2026-03-02".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.entrada, Some("08:30:00".parse().unwrap()));
    }

    #[tokio::test]
    async fn fallback_produces_exactly_one_suggestion() {
        let f = setup().await;

        let applied = f
            .resolver
            .suggestion_fallback(UNKNOWN_ACTOR_ID, "a pia da cozinha está vazando")
            .await
            .unwrap();
        assert!(applied.wrote);

        let count: i64 = f
            .records
            .db()
            .unwrap()
            .connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM suggestions", [], |r| r.get(0))?;
                Ok::<i64, tokio_rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
