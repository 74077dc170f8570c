// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use csutrack_config::model::{PushConfig, WorkerConfig};
use csutrack_test_utils::{ClientCall, MemoryNotificationSink, MockClients, MockFetcher};
use csutrack_worker::push::{ACTION_DISMISS, ACTION_LOG};
use csutrack_worker::{ClickOutcome, MemoryCacheStorage, ServiceWorker};

const ORIGIN: &str = "https://csu.example.org";

fn worker(clients: Arc<MockClients>, sink: Arc<MemoryNotificationSink>) -> ServiceWorker {
    ServiceWorker::new(
        WorkerConfig {
            origin: ORIGIN.into(),
            ..WorkerConfig::default()
        },
        PushConfig::default(),
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(MockFetcher::new()),
        clients,
        sink,
    )
}

#[tokio::test]
async fn push_shows_sticky_notification_with_actions() {
    let sink = Arc::new(MemoryNotificationSink::new());
    let sw = worker(Arc::new(MockClients::new()), sink.clone());

    let shown = sw.on_push(Some(br#"{"body":"Log your symptoms"}"#));

    assert_eq!(sink.shown(), vec![shown.clone()]);
    assert_eq!(shown.body, "Log your symptoms");
    assert_eq!(shown.title, PushConfig::default().title);
    assert!(shown.require_interaction);
    assert_eq!(shown.actions.len(), 2);
}

#[tokio::test]
async fn click_focuses_existing_same_origin_window() {
    let clients = Arc::new(
        MockClients::new()
            .with_window("other", "https://elsewhere.example.com/")
            .with_window("app", "https://csu.example.org/tracking/history/"),
    );
    let sink = Arc::new(MemoryNotificationSink::new());
    let sw = worker(clients.clone(), sink.clone());
    let notification = sw.on_push(None);

    let outcome = sw
        .on_notification_click(&notification, Some(ACTION_LOG))
        .await
        .unwrap();

    let target = "https://csu.example.org/tracking/log/".to_string();
    assert_eq!(
        outcome,
        ClickOutcome::Focused {
            client_id: "app".into(),
            url: target.clone()
        }
    );
    assert_eq!(
        clients.calls(),
        vec![
            ClientCall::Navigate {
                id: "app".into(),
                url: target
            },
            ClientCall::Focus { id: "app".into() },
        ]
    );
    assert_eq!(sink.closed(), vec![notification.tag]);
}

#[tokio::test]
async fn click_without_window_opens_notification_target() {
    let clients = Arc::new(MockClients::new());
    let sw = worker(clients.clone(), Arc::new(MemoryNotificationSink::new()));
    let notification = sw.on_push(Some(br#"{"data":{"url":"/tracking/log/2026-02-01/"}}"#));

    let outcome = sw.on_notification_click(&notification, None).await.unwrap();

    assert!(matches!(outcome, ClickOutcome::Opened { ref url, .. }
        if url == "https://csu.example.org/tracking/log/2026-02-01/"));
    assert_eq!(clients.windows().len(), 1);
    assert!(clients.windows()[0].focused);
}

#[tokio::test]
async fn dismiss_only_closes() {
    let clients = Arc::new(MockClients::new().with_window("app", "https://csu.example.org/"));
    let sink = Arc::new(MemoryNotificationSink::new());
    let sw = worker(clients.clone(), sink.clone());
    let notification = sw.on_push(None);

    let outcome = sw
        .on_notification_click(&notification, Some(ACTION_DISMISS))
        .await
        .unwrap();

    assert_eq!(outcome, ClickOutcome::Dismissed);
    assert!(clients.calls().is_empty());
    assert_eq!(sink.closed().len(), 1);
}
