// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios for the complete offline layer.
//!
//! Each test creates an isolated TestHarness with a temp SQLite store and
//! mock collaborators. Tests are independent and order-insensitive.

use std::sync::Arc;

use chrono::NaiveDate;

use csutrack_config::model::{FormsConfig, PushConfig, SyncConfig, WorkerConfig};
use csutrack_core::{
    EntryDraft, FormFields, HttpMethod, LocalStore, PayloadEnvelope, SyncTransport, ToastKind,
};
use csutrack_sync::interceptor::OFFLINE_SAVED_MESSAGE;
use csutrack_sync::{ConnectivityMonitor, Disposition, FormSubmission, HttpTransport};
use csutrack_test_utils::{MemoryNotificationSink, MockClients, MockFetcher, TestHarness};
use csutrack_worker::{
    CacheStorage, FetchRequest, FetchResponse, MemoryCacheStorage, RequestMode, ServiceWorker,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---- Offline entry, then reconnect ----

#[tokio::test]
async fn offline_entry_syncs_after_reconnect() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let day = date(2026, 2, 1);
    let submission = FormSubmission::new("/tracking/log/", HttpMethod::Post)
        .field("csrfmiddlewaretoken", "tok")
        .field("date", "2026-02-01")
        .field("score", "4")
        .field("itch_score", "2")
        .field("hive_count_score", "2");

    let disposition = h.interceptor.handle(&submission, day).await.unwrap();
    assert!(matches!(disposition, Disposition::Queued { .. }));

    let entry = h.store.get_entry(day).await.unwrap().unwrap();
    assert_eq!(entry.score, 4);
    assert!(!entry.synced);

    let queue = h.store.get_sync_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].endpoint, "/tracking/log/");
    assert_eq!(queue[0].retries, 0);
    let PayloadEnvelope { body, .. } = queue[0].payload().unwrap();
    let csutrack_core::MutationBody::Form { fields } = body else {
        panic!("expected a form body");
    };
    assert_eq!(fields.get("score"), Some("4"));

    assert_eq!(
        h.notifier.toasts(),
        vec![(OFFLINE_SAVED_MESSAGE.to_string(), ToastKind::Success)]
    );

    h.go_online();
    h.sync().await.unwrap();

    assert!(h.store.get_entry(day).await.unwrap().unwrap().synced);
    assert!(h.store.get_sync_queue().await.unwrap().is_empty());
}

// ---- Poison item eviction across six passes ----

#[tokio::test]
async fn queued_item_is_evicted_after_sixth_failed_pass() {
    let h = TestHarness::new().await.unwrap();
    let data = PayloadEnvelope::form(FormFields::from_pairs([("score", "1")]))
        .encode()
        .unwrap();
    h.store
        .queue_for_sync("/tracking/log/", HttpMethod::Post, data)
        .await
        .unwrap();
    h.transport.fail_endpoint("/tracking/log/");

    for _ in 0..5 {
        h.sync().await.unwrap();
    }
    let queue = h.store.get_sync_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].retries, 5);

    h.sync().await.unwrap();
    assert!(h.store.get_sync_queue().await.unwrap().is_empty());
    assert_eq!(h.store.list_dead_letters().await.unwrap().len(), 1);
}

// ---- Entry overwrite resets the synced flag ----

#[tokio::test]
async fn resaving_a_synced_day_replaces_it_and_marks_it_unsynced() {
    let h = TestHarness::new().await.unwrap();
    let day = date(2026, 2, 3);
    h.store
        .save_entry(EntryDraft {
            date: day,
            score: 6,
            itch_score: 3,
            hive_score: 3,
            notes: "flare".into(),
            ..EntryDraft::default()
        })
        .await
        .unwrap();
    h.sync().await.unwrap();
    assert!(h.store.get_entry(day).await.unwrap().unwrap().synced);

    h.store
        .save_entry(EntryDraft {
            date: day,
            score: 1,
            itch_score: 1,
            ..EntryDraft::default()
        })
        .await
        .unwrap();

    let entry = h.store.get_entry(day).await.unwrap().unwrap();
    assert_eq!(entry.score, 1);
    assert_eq!(entry.notes, "");
    assert!(!entry.synced);
}

// ---- Connectivity debouncing ----

#[test]
fn repeated_connectivity_signals_fire_once_per_transition() {
    let monitor = ConnectivityMonitor::new(false);
    let fired = [true, true, false, false, true]
        .into_iter()
        .filter_map(|online| monitor.report(online))
        .count();
    assert_eq!(fired, 3);
}

// ---- Upsert replay is idempotent on the wire ----

#[tokio::test]
async fn repeated_entry_upsert_sends_identical_requests() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let h = TestHarness::new().await.unwrap();
    let entry = h
        .store
        .save_entry(EntryDraft {
            date: date(2026, 2, 4),
            score: 3,
            itch_score: 2,
            hive_score: 1,
            ..EntryDraft::default()
        })
        .await
        .unwrap();

    let transport = HttpTransport::new(
        &SyncConfig {
            server_url: server.uri(),
            ..SyncConfig::default()
        },
        &FormsConfig::default(),
    )
    .unwrap();
    transport.upsert_entry(&entry).await.unwrap();
    transport.upsert_entry(&entry).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, requests[1].url);
    assert_eq!(requests[0].body, requests[1].body);
    assert!(requests[0].url.path().ends_with("/2026-02-04/"));
}

// ---- Worker: generation isolation and document bypass ----

#[tokio::test]
async fn worker_upgrade_leaves_exactly_one_generation() {
    let origin = "https://csu.example.org";
    let cache = Arc::new(MemoryCacheStorage::new());
    let fetcher = Arc::new(MockFetcher::new());
    for asset in WorkerConfig::default().install_manifest() {
        fetcher.serve(&format!("{origin}{asset}"), &asset);
    }

    let make = |version: &str| {
        ServiceWorker::new(
            WorkerConfig {
                cache_version: version.into(),
                origin: origin.into(),
                ..WorkerConfig::default()
            },
            PushConfig::default(),
            cache.clone(),
            fetcher.clone(),
            Arc::new(MockClients::new()),
            Arc::new(MemoryNotificationSink::new()),
        )
    };

    for version in ["csu-static-v1", "csu-static-v2"] {
        let sw = make(version);
        sw.controller().install().await.unwrap();
        sw.controller().activate().await.unwrap();
        assert_eq!(cache.keys().await.unwrap(), vec![version.to_string()]);
    }

    let sw = make("csu-static-v3");
    sw.controller().install().await.unwrap();
    sw.controller().activate().await.unwrap();

    let page = format!("{origin}/static/index.html");
    cache
        .put("csu-static-v3", &page, FetchResponse::ok(&page, "cached"))
        .await
        .unwrap();
    let navigation = FetchRequest::get(&page).with_mode(RequestMode::Navigate);
    let html = FetchRequest::get(&page).with_accept("text/html");
    assert!(sw.controller().handle_fetch(&navigation).await.unwrap().is_none());
    assert!(sw.controller().handle_fetch(&html).await.unwrap().is_none());
}
