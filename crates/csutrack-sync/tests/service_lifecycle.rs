// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use chrono::NaiveDate;

use csutrack_core::{CsuError, LocalStore};
use csutrack_test_utils::TestHarness;

/// Polls until the queue and unsynced entries are empty.
async fn wait_until_drained(h: &TestHarness) {
    for _ in 0..200 {
        let stats = h.store.stats().await.unwrap();
        if stats.queued == 0 && stats.unsynced_entries == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("background drain did not finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reconnect_triggers_background_drain() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let service = h.service();
    service.init().await.unwrap();

    h.submit_log(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), 1, 1)
        .await
        .unwrap();
    assert_eq!(h.store.stats().await.unwrap().queued, 1);

    h.go_online();
    wait_until_drained(&h).await;

    assert_eq!(h.transport.replayed_ids().len(), 1);
    service.shutdown().await.unwrap();
    assert_eq!(h.notifier.connectivity_changes(), vec![true]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_signals_notify_once_per_transition() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let service = h.service();
    service.init().await.unwrap();

    for online in [true, true, false, false, true] {
        h.monitor.report(online);
    }
    for _ in 0..200 {
        if h.notifier.connectivity_changes().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    service.shutdown().await.unwrap();

    assert_eq!(h.notifier.connectivity_changes(), vec![true, false, true]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn startup_drains_when_already_online() {
    let h = TestHarness::new().await.unwrap();
    h.transport.fail_next(1);
    h.store
        .save_entry(csutrack_core::EntryDraft {
            date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            score: 2,
            itch_score: 1,
            hive_score: 1,
            notes: String::new(),
            photo_url: None,
            triggers: vec![],
            qol_data: Default::default(),
        })
        .await
        .unwrap();

    let service = h.service();
    service.init().await.unwrap();
    // The startup attempt fails; explicit retries pick the entry up.
    for _ in 0..200 {
        service.sync_now().await.unwrap();
        if h.store.stats().await.unwrap().unsynced_entries == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    wait_until_drained(&h).await;
    assert!(!h.transport.upserted_dates().is_empty());
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_closes_the_store() {
    let h = TestHarness::new().await.unwrap();
    let service = h.service();
    service.init().await.unwrap();
    service.shutdown().await.unwrap();

    let err = h.store.stats().await.unwrap_err();
    assert!(matches!(err, CsuError::StoreUnavailable(_)));
}
