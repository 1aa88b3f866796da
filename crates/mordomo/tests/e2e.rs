// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a full conversation through the supervisor, router,
//! confirmation store, and resolver, over the mock channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mordomo_agent::{AgentLoop, ChannelSupervisor};
use mordomo_core::types::{ClassificationSource, ClassifiedIntent, InboundMessage, IntentKind};
use mordomo_core::RecordStore;
use mordomo_router::MessageRouter;
use mordomo_storage::SqliteStore;
use mordomo_test_utils::{
    make_text_message, temp_store, test_config, MockAlertSink, MockChannel, MockClassifier,
    MockSpeech, MockVision,
};
use tokio_util::sync::CancellationToken;

struct App {
    records: Arc<SqliteStore>,
    channel: Arc<MockChannel>,
    classifier: Arc<MockClassifier>,
    alerts: Arc<MockAlertSink>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), mordomo_core::MordomoError>>,
    _dir: tempfile::TempDir,
}

async fn start_app() -> App {
    let (records, dir) = temp_store().await;
    let channel = Arc::new(MockChannel::new());
    let classifier = Arc::new(MockClassifier::new());
    let alerts = Arc::new(MockAlertSink::new());

    let router = Arc::new(MessageRouter::new(
        records.clone() as Arc<dyn RecordStore>,
        classifier.clone(),
        Arc::new(MockSpeech::new()),
        Arc::new(MockVision::new()),
        channel.clone(),
        alerts.clone(),
        &test_config(),
    ));
    let mut supervisor_config = test_config().supervisor;
    supervisor_config.retry_delay_secs = 0;
    let supervisor = Arc::new(ChannelSupervisor::new(
        channel.clone(),
        alerts.clone(),
        supervisor_config,
        true,
    ));
    let agent = AgentLoop::new(
        supervisor,
        router,
        records.clone() as Arc<dyn RecordStore>,
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move { agent.run(run_cancel).await });

    App {
        records,
        channel,
        classifier,
        alerts,
        cancel,
        handle,
        _dir: dir,
    }
}

fn intent(kind: IntentKind, confidence: u8, explicit: Option<&str>) -> ClassifiedIntent {
    ClassifiedIntent {
        kind,
        confidence,
        explicit_time: explicit.map(|t| t.parse().unwrap()),
        extracted: None,
        source: ClassificationSource::Structured,
    }
}

/// Message stamped at 2026-03-02 14:00 UTC = 11:00 household-local (UTC-3).
fn message(id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap(),
        ..make_text_message(id, "chat-1", text)
    }
}

/// Waits until the channel has sent at least `n` messages.
async fn wait_for_sent(channel: &MockChannel, n: usize) {
    for _ in 0..200 {
        if channel.sent_count().await >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {n} sent messages");
}

#[tokio::test]
async fn full_day_conversation_with_confirmation_and_redelivery() {
    let app = start_app().await;

    // Morning greeting: high confidence, auto-applied at message time.
    app.classifier
        .push_intent(intent(IntentKind::Entrada, 95, None))
        .await;
    app.channel.inject_message(message("m1", "bom dia")).await;
    wait_for_sent(&app.channel, 1).await;

    let sent = app.channel.sent_messages().await;
    assert!(sent[0].text.contains("Entrada registrada às 11:00"));

    let actor = app
        .records
        .find_actor_by_phone("5511912345678")
        .await
        .unwrap()
        .expect("actor auto-created");

    // Lunch break named with uncertain confidence: a question is asked.
    app.classifier
        .push_intent(intent(IntentKind::SaidaAlmoco, 60, Some("12:15:00")))
        .await;
    app.channel
        .inject_message(message("m2", "saindo pro almoço, 12:15"))
        .await;
    wait_for_sent(&app.channel, 2).await;

    let sent = app.channel.sent_messages().await;
    assert!(sent[1].text.contains("12:15"));
    assert!(sent[1].text.contains("sim ou não"));

    // No lunch punch yet.
    let day = app
        .records
        .find_day(actor.id, "2026-03-02".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(day.lunch_out.is_none());

    // The reply confirms; the punch is written at the confirmed time.
    app.channel.inject_message(message("m3", "sim")).await;
    wait_for_sent(&app.channel, 3).await;

    let day = app
        .records
        .find_day(actor.id, "2026-03-02".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day.lunch_out, Some("12:15:00".parse().unwrap()));

    // The platform redelivers the greeting: de-duplication swallows it.
    app.classifier
        .push_intent(intent(IntentKind::Saida, 99, None))
        .await;
    app.channel.inject_message(message("m1", "bom dia")).await;
    app.channel.inject_message(message("m4", "até amanhã!")).await;
    wait_for_sent(&app.channel, 4).await;

    let day = app
        .records
        .find_day(actor.id, "2026-03-02".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day.entrada, Some("11:00:00".parse().unwrap()));
    // The scripted saida intent was consumed by m4, not by the redelivery.
    assert_eq!(day.saida, Some("11:00:00".parse().unwrap()));

    app.cancel.cancel();
    app.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn channel_disconnect_is_supervised_and_processing_resumes() {
    let app = start_app().await;

    app.classifier
        .push_intent(intent(IntentKind::Entrada, 95, None))
        .await;
    app.channel.inject_message(message("m1", "bom dia")).await;
    wait_for_sent(&app.channel, 1).await;

    // Drop the session; the supervisor alerts and reconnects, and a message
    // queued during the outage is still processed.
    app.classifier
        .push_intent(intent(IntentKind::Saida, 95, None))
        .await;
    app.channel.inject_message(message("m2", "fui, até amanhã")).await;
    app.channel.trigger_disconnect();

    wait_for_sent(&app.channel, 2).await;

    // The disconnect alert is raised by the supervisor's receive loop; give
    // it a moment when message processing won the race.
    let mut alerted = false;
    for _ in 0..200 {
        alerted = app.alerts.events().await.iter().any(|e| {
            matches!(e, mordomo_core::types::AlertEvent::ChannelDisconnected { .. })
        });
        if alerted {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(alerted, "supervisor should alert on channel disconnect");

    let actor = app
        .records
        .find_actor_by_phone("5511912345678")
        .await
        .unwrap()
        .unwrap();
    let day = app
        .records
        .find_day(actor.id, "2026-03-02".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(day.saida.is_some());

    app.cancel.cancel();
    app.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn denied_confirmation_leaves_no_record() {
    let app = start_app().await;

    app.classifier
        .push_intent(intent(IntentKind::Entrada, 70, Some("08:30:00")))
        .await;
    app.channel
        .inject_message(message("m1", "cheguei às 8:30"))
        .await;
    wait_for_sent(&app.channel, 1).await;

    app.channel.inject_message(message("m2", "não")).await;
    wait_for_sent(&app.channel, 2).await;

    let actor = app
        .records
        .find_actor_by_phone("5511912345678")
        .await
        .unwrap()
        .unwrap();
    assert!(app
        .records
        .find_day(actor.id, "2026-03-02".parse().unwrap())
        .await
        .unwrap()
        .is_none());
    assert!(app
        .records
        .get_pending_confirmation(actor.id)
        .await
        .unwrap()
        .is_none());

    app.cancel.cancel();
    app.handle.await.unwrap().unwrap();
}
