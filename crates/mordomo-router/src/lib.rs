// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message router for the Mordomo household agent.
//!
//! Receives normalized channel events and drives each through the pipeline:
//! de-duplication, actor resolution, pending-reply short-circuit, media
//! normalization, classification, the confidence decision policy, and
//! finally the resolver. Steps that touch per-actor state run on that
//! actor's serialization lane; different actors process in parallel.
//!
//! A single message's failure is logged with actor, message id, and kind
//! context and never affects the processing of subsequent messages.

pub mod decision;
pub mod lanes;
pub mod memory;

use std::sync::Arc;

use chrono::FixedOffset;
use mordomo_confirm::{parse_reply, PendingStore, ReplyIntent, Resolution};
use mordomo_config::MordomoConfig;
use mordomo_core::text::{fold_text, normalize_phone};
use mordomo_core::types::{
    Actor, AlertEvent, ClassifiedIntent, ClassifyRequest, ConfirmationPayload, ExtractedFields,
    InboundMessage, IntentKind, MediaKind, NewActor, OutboundMessage, PendingConfirmation,
};
use mordomo_core::{
    AlertSink, ChannelAdapter, IntentClassifier, MordomoError, RecordStore, SpeechTranscriber,
    UNKNOWN_ACTOR_ID, VisionExtractor,
};
use mordomo_resolver::{ActionResolver, EffectContext};
use tracing::{debug, error, info, warn};

use crate::decision::{decide, Decision, CONFIRM_FLOOR};
use crate::lanes::ActorLanes;
use crate::memory::ConversationMemory;

/// Display name the agent signs its own conversation memory lines with.
const AGENT_SPEAKER: &str = "mordomo";

/// Central router wiring classifier, confirmation store, and resolver.
pub struct MessageRouter {
    records: Arc<dyn RecordStore>,
    classifier: Arc<dyn IntentClassifier>,
    speech: Arc<dyn SpeechTranscriber>,
    vision: Arc<dyn VisionExtractor>,
    channel: Arc<dyn ChannelAdapter>,
    alerts: Arc<dyn AlertSink>,
    pending: PendingStore,
    resolver: ActionResolver,
    memory: ConversationMemory,
    lanes: ActorLanes,
    tz_offset: FixedOffset,
}

impl MessageRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Arc<dyn RecordStore>,
        classifier: Arc<dyn IntentClassifier>,
        speech: Arc<dyn SpeechTranscriber>,
        vision: Arc<dyn VisionExtractor>,
        channel: Arc<dyn ChannelAdapter>,
        alerts: Arc<dyn AlertSink>,
        config: &MordomoConfig,
    ) -> Self {
        let tz_offset = FixedOffset::east_opt(config.agent.timezone_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self {
            pending: PendingStore::new(records.clone(), &config.confirmation),
            resolver: ActionResolver::new(records.clone()),
            memory: ConversationMemory::new(&config.memory),
            lanes: ActorLanes::new(),
            records,
            classifier,
            speech,
            vision,
            channel,
            alerts,
            tz_offset,
        }
    }

    /// Entry point for one channel event: de-duplicates, resolves the actor,
    /// and queues the rest of the pipeline on the actor's lane. Returns once
    /// the message is queued.
    pub async fn handle(self: &Arc<Self>, msg: InboundMessage) -> Result<(), MordomoError> {
        if !self.records.mark_processed(&msg.id).await? {
            debug!(message_id = %msg.id, "duplicate channel message, skipping");
            return Ok(());
        }

        let actor = self.resolve_actor(&msg).await?;
        let actor_id = actor.id;
        let router = Arc::clone(self);

        self.lanes
            .dispatch(actor_id, async move {
                let message_id = msg.id.clone();
                if let Err(e) = router.process(actor, msg).await {
                    error!(
                        error = %e,
                        actor_id,
                        message_id = %message_id,
                        "message pipeline failed"
                    );
                }
            })
            .await;
        Ok(())
    }

    /// Replays missed messages in silent mode: original timestamps, no
    /// confirmations, per-message failures logged and skipped.
    pub async fn replay_missed(self: &Arc<Self>, messages: Vec<InboundMessage>) -> usize {
        let total = messages.len();
        let mut dispatched = 0;
        for mut msg in messages {
            msg.silent = true;
            match self.handle(msg).await {
                Ok(()) => dispatched += 1,
                Err(e) => error!(error = %e, "replayed message failed to queue, continuing"),
            }
        }
        info!(dispatched, total, "missed message replay queued");
        dispatched
    }

    /// Waits until all messages queued for an actor have been processed.
    pub async fn wait_idle(&self, actor_id: i64) {
        self.lanes.barrier(actor_id).await;
    }

    /// Drains all lanes.
    pub async fn shutdown(&self) {
        self.lanes.shutdown().await;
    }

    /// Resolves the sender to an actor: normalized phone first, folded
    /// display name second, the unknown actor last.
    async fn resolve_actor(&self, msg: &InboundMessage) -> Result<Actor, MordomoError> {
        let phone = normalize_phone(&msg.sender_phone);
        if !phone.is_empty()
            && let Some(actor) = self.records.find_actor_by_phone(&phone).await?
        {
            return Ok(actor);
        }

        let folded = fold_text(msg.sender_name.trim());
        if !folded.is_empty()
            && let Some(actor) = self.records.find_actor_by_name(&folded).await?
        {
            return Ok(actor);
        }

        self.records
            .get_actor(UNKNOWN_ACTOR_ID)
            .await?
            .ok_or_else(|| MordomoError::Internal("unknown actor seed row missing".into()))
    }

    /// The per-actor pipeline body. Runs on the actor's lane.
    async fn process(&self, actor: Actor, msg: InboundMessage) -> Result<(), MordomoError> {
        // Pending short-circuit: an open question absorbs yes/no replies.
        // Replayed messages never resolve confirmations.
        if !msg.silent
            && let Some(pending) = self.pending.get_pending(actor.id).await?
        {
            let reply = parse_reply(&msg.text);
            if reply != ReplyIntent::None {
                return self.handle_reply(&msg, &pending, reply).await;
            }
            // Unrecognized text falls through to normal classification.
        }

        // Media normalization: audio becomes text, images become fields.
        let (effective_text, vision_fields) = match self.normalize_media(&msg).await? {
            Some(normalized) => normalized,
            None => return Ok(()), // rate-limited; sender already told
        };

        // Classification. Transport failures degrade to no intent; the
        // pipeline continues so substantive text still reaches the fallback.
        let request = ClassifyRequest {
            text: effective_text.clone(),
            media_kind: msg.media.as_ref().map(|m| m.kind),
            sender_name: msg.sender_name.clone(),
            known_actors: self.records.list_actor_names().await?,
            context: self.memory.context(&msg.chat_id),
        };
        let mut intent = match self.classifier.classify(&request).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(
                    error = %e,
                    message_id = %msg.id,
                    "classification failed, degrading to no intent"
                );
                ClassifiedIntent::none()
            }
        };
        if intent.extracted.is_none() {
            intent.extracted = vision_fields;
        }

        // A time-clock intent from an unrecognized sender creates the actor
        // from the chat identity.
        let actor = self.maybe_create_actor(actor, &msg, &intent).await?;

        let local = msg.timestamp.with_timezone(&self.tz_offset);
        let date = local.date_naive();
        let message_time = local.time();

        match decide(&intent, message_time, &effective_text, msg.silent) {
            Decision::AutoApply { time } => {
                let ctx = EffectContext {
                    actor: &actor,
                    date,
                    time,
                    at: msg.timestamp,
                    text: &effective_text,
                    extracted: intent.extracted.as_ref(),
                };
                let applied = self.resolver.apply_intent(intent.kind, &ctx).await?;
                info!(
                    actor_id = actor.id,
                    kind = %intent.kind,
                    confidence = intent.confidence,
                    wrote = applied.wrote,
                    "intent auto-applied"
                );
                self.memory.append(&msg.chat_id, &msg.sender_name, &effective_text);
                if !msg.silent {
                    self.memory.append(&msg.chat_id, AGENT_SPEAKER, &applied.ack);
                    self.send_reply(&msg, &applied.ack).await;
                }
            }
            Decision::Confirm { time } => {
                let suggestion_id = if intent.kind == IntentKind::Suggestion {
                    Some(
                        self.resolver
                            .stage_suggestion(actor.id, &effective_text)
                            .await?
                            .id,
                    )
                } else {
                    None
                };
                let payload = ConfirmationPayload {
                    kind: intent.kind,
                    chat_id: msg.chat_id.clone(),
                    text: effective_text.clone(),
                    extracted: intent.extracted.clone(),
                    suggestion_id,
                };
                let subject_time = intent.kind.is_punch().then_some(time);
                self.pending
                    .create(actor.id, intent.kind, date, subject_time, &payload)
                    .await?;

                let question =
                    question_for(intent.kind, time, intent.extracted.as_ref(), &effective_text);
                info!(
                    actor_id = actor.id,
                    kind = %intent.kind,
                    confidence = intent.confidence,
                    "confirmation requested"
                );
                self.memory.append(&msg.chat_id, &msg.sender_name, &effective_text);
                self.memory.append(&msg.chat_id, AGENT_SPEAKER, &question);
                self.send_reply(&msg, &question).await;
            }
            Decision::SuggestionFallback => {
                let applied = self
                    .resolver
                    .suggestion_fallback(actor.id, &effective_text)
                    .await?;
                self.memory.append(&msg.chat_id, &msg.sender_name, &effective_text);
                if !msg.silent {
                    self.memory.append(&msg.chat_id, AGENT_SPEAKER, &applied.ack);
                    self.send_reply(&msg, &applied.ack).await;
                }
            }
            Decision::Ignore => {
                debug!(
                    actor_id = actor.id,
                    kind = %intent.kind,
                    confidence = intent.confidence,
                    "no actionable intent, ignoring"
                );
                self.memory.append(&msg.chat_id, &msg.sender_name, &effective_text);
            }
        }

        Ok(())
    }

    /// Applies a yes/no reply to the actor's pending confirmation.
    async fn handle_reply(
        &self,
        msg: &InboundMessage,
        pending: &PendingConfirmation,
        reply: ReplyIntent,
    ) -> Result<(), MordomoError> {
        let resolution = match reply {
            ReplyIntent::Confirmed => Resolution::Confirmed,
            ReplyIntent::Denied => Resolution::Denied,
            ReplyIntent::None => {
                return Err(MordomoError::Internal("unparsed reply reached handler".into()))
            }
        };

        // The pending -> resolved transition is the apply-once gate; losing
        // it means the entry expired or was superseded since we read it.
        if !self.pending.resolve(&pending.id, resolution).await? {
            self.send_reply(msg, "Essa confirmação não está mais aberta.").await;
            return Ok(());
        }

        let applied = match resolution {
            Resolution::Confirmed => self.resolver.apply_confirmed(pending).await?,
            Resolution::Denied => self.resolver.apply_denied(pending).await?,
        };
        info!(
            actor_id = pending.actor_id,
            confirmation_id = %pending.id,
            resolution = ?resolution,
            "pending confirmation resolved"
        );

        self.memory.append(&msg.chat_id, &msg.sender_name, &msg.text);
        self.memory.append(&msg.chat_id, AGENT_SPEAKER, &applied.ack);
        self.send_reply(msg, &applied.ack).await;
        Ok(())
    }

    /// Downloads and normalizes media. Returns `None` when processing must
    /// stop (speech quota exhausted; the sender was already answered).
    async fn normalize_media(
        &self,
        msg: &InboundMessage,
    ) -> Result<Option<(String, Option<ExtractedFields>)>, MordomoError> {
        let Some(media) = &msg.media else {
            return Ok(Some((msg.text.clone(), None)));
        };

        match media.kind {
            MediaKind::Audio => match self.channel.download_media(media).await {
                Ok(bytes) => match self.speech.transcribe(&bytes, &media.mime).await {
                    Ok(transcript) => Ok(Some((transcript, None))),
                    Err(MordomoError::RateLimited { message }) => {
                        self.alerts
                            .notify(AlertEvent::RateLimited {
                                service: "speech".to_string(),
                            })
                            .await;
                        if !msg.silent {
                            self.send_reply(msg, &message).await;
                        }
                        Ok(None)
                    }
                    Err(e) => {
                        warn!(error = %e, message_id = %msg.id, "transcription failed, using caption text");
                        Ok(Some((msg.text.clone(), None)))
                    }
                },
                Err(e) => {
                    warn!(error = %e, message_id = %msg.id, "audio download failed, using caption text");
                    Ok(Some((msg.text.clone(), None)))
                }
            },
            MediaKind::Image => match self.channel.download_media(media).await {
                Ok(bytes) => match self.vision.extract(&bytes, &media.mime).await {
                    Ok(fields) => Ok(Some((msg.text.clone(), Some(fields)))),
                    Err(e) => {
                        warn!(error = %e, message_id = %msg.id, "image extraction failed");
                        Ok(Some((msg.text.clone(), None)))
                    }
                },
                Err(e) => {
                    warn!(error = %e, message_id = %msg.id, "image download failed");
                    Ok(Some((msg.text.clone(), None)))
                }
            },
        }
    }

    /// Auto-creates an actor from the chat identity when a time-clock intent
    /// arrives for an unrecognized sender.
    async fn maybe_create_actor(
        &self,
        actor: Actor,
        msg: &InboundMessage,
        intent: &ClassifiedIntent,
    ) -> Result<Actor, MordomoError> {
        if actor.id != UNKNOWN_ACTOR_ID
            || !intent.kind.is_punch()
            || intent.confidence < CONFIRM_FLOOR
        {
            return Ok(actor);
        }

        // An earlier message on this lane may have created the sender
        // already while this one was queued.
        let normalized = normalize_phone(&msg.sender_phone);
        if !normalized.is_empty()
            && let Some(existing) = self.records.find_actor_by_phone(&normalized).await?
        {
            return Ok(existing);
        }

        let name = if msg.sender_name.trim().is_empty() {
            msg.sender_phone.clone()
        } else {
            msg.sender_name.trim().to_string()
        };
        let phone = normalize_phone(&msg.sender_phone);
        let created = self
            .records
            .create_actor(&NewActor {
                name,
                phone: (!phone.is_empty()).then_some(phone),
            })
            .await?;
        info!(
            actor_id = created.id,
            "auto-created actor from chat identity for time-clock intent"
        );
        Ok(created)
    }

    /// Sends one outbound reply. Failures are logged, never retried, so a
    /// confirmation question is never duplicated.
    async fn send_reply(&self, msg: &InboundMessage, text: &str) {
        let out = OutboundMessage {
            chat_id: msg.chat_id.clone(),
            text: text.to_string(),
            reply_to: Some(msg.id.clone()),
        };
        if let Err(e) = self.channel.send(out).await {
            error!(error = %e, chat_id = %msg.chat_id, "failed to send reply");
        }
    }
}

/// The question asked when an intent needs confirmation.
fn question_for(
    kind: IntentKind,
    time: chrono::NaiveTime,
    extracted: Option<&ExtractedFields>,
    text: &str,
) -> String {
    let hhmm = time.format("%H:%M");
    match kind {
        IntentKind::Entrada => format!("Registrar entrada às {hhmm}? Responda sim ou não."),
        IntentKind::Saida => format!("Registrar saída às {hhmm}? Responda sim ou não."),
        IntentKind::SaidaAlmoco => {
            format!("Registrar saída para almoço às {hhmm}? Responda sim ou não.")
        }
        IntentKind::RetornoAlmoco => {
            format!("Registrar retorno do almoço às {hhmm}? Responda sim ou não.")
        }
        IntentKind::Document => match extracted.and_then(|e| e.person_name.as_deref()) {
            Some(person) => format!("Recebi um documento de {person}. Registro? (sim/não)"),
            None => "Recebi um documento. Registro? (sim/não)".to_string(),
        },
        IntentKind::Delivery => "Registrar esta entrega? (sim/não)".to_string(),
        IntentKind::Invoice => match extracted.and_then(|e| e.vendor.as_deref()) {
            Some(vendor) => format!("Registrar a nota fiscal de {vendor}? (sim/não)"),
            None => "Registrar esta nota fiscal? (sim/não)".to_string(),
        },
        IntentKind::Receipt => "Registrar este recibo? (sim/não)".to_string(),
        IntentKind::Suggestion => {
            format!("Quer que eu anote como tarefa: \"{text}\"? (sim/não)")
        }
        IntentKind::None => "Confirma? (sim/não)".to_string(),
    }
}
