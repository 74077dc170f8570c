// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::NaiveDate;

use csutrack_core::{HttpMethod, LocalStore, ToastKind};
use csutrack_sync::interceptor::OFFLINE_SAVED_MESSAGE;
use csutrack_sync::{Disposition, FormSubmission};
use csutrack_test_utils::TestHarness;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
}

#[tokio::test]
async fn online_submissions_pass_through() {
    let h = TestHarness::new().await.unwrap();
    let submission = FormSubmission::new("/tracking/log/", HttpMethod::Post).field("score", "2");

    let disposition = h.interceptor.handle(&submission, today()).await.unwrap();

    assert_eq!(disposition, Disposition::PassThrough);
    assert_eq!(h.store.stats().await.unwrap().queued, 0);
    assert!(h.notifier.toasts().is_empty());
}

#[tokio::test]
async fn forms_without_opt_in_are_never_touched() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let submission = FormSubmission::new("/accounts/settings/", HttpMethod::Post)
        .field("theme", "dark")
        .not_offline_capable();

    let disposition = h.interceptor.handle(&submission, today()).await.unwrap();

    assert_eq!(disposition, Disposition::NotIntercepted);
    assert_eq!(h.store.stats().await.unwrap().queued, 0);
}

#[tokio::test]
async fn non_log_form_is_queued_without_entry() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let submission = FormSubmission::new("/accounts/reminders/", HttpMethod::Post)
        .field("time", "20:00");

    let disposition = h.interceptor.handle(&submission, today()).await.unwrap();

    assert!(matches!(disposition, Disposition::Queued { entry: None, .. }));
    let queue = h.store.get_sync_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].endpoint, "/accounts/reminders/");
    assert_eq!(queue[0].method, HttpMethod::Post);
    assert_eq!(h.store.stats().await.unwrap().entries, 0);
    assert_eq!(
        h.notifier.toasts(),
        vec![(OFFLINE_SAVED_MESSAGE.to_string(), ToastKind::Success)]
    );
}

#[tokio::test]
async fn csrf_token_falls_back_to_cookie() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let mut submission =
        FormSubmission::new("/accounts/reminders/", HttpMethod::Post).field("time", "08:00");
    submission.cookies = Some("sessionid=abc; csrftoken=from-cookie".into());

    h.interceptor.handle(&submission, today()).await.unwrap();

    assert_eq!(h.transport.csrf_token().as_deref(), Some("from-cookie"));
    let stored = h
        .store
        .get_cached_user_data(csutrack_sync::csrf::CSRF_TOKEN_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.data, "from-cookie");
}

#[tokio::test]
async fn invalid_log_form_is_still_queued() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    let submission =
        FormSubmission::new("/tracking/log/", HttpMethod::Post).field("itch_score", "9");

    let disposition = h.interceptor.handle(&submission, today()).await.unwrap();

    assert!(matches!(disposition, Disposition::Queued { entry: None, .. }));
    assert_eq!(h.store.stats().await.unwrap().queued, 1);
    assert!(h.store.get_entry(today()).await.unwrap().is_none());
}

#[tokio::test]
async fn resubmitting_a_day_overwrites_the_local_entry() {
    let h = TestHarness::builder().offline().build().await.unwrap();
    h.submit_log(today(), 1, 1).await.unwrap();
    h.submit_log(today(), 3, 2).await.unwrap();

    let entry = h.store.get_entry(today()).await.unwrap().unwrap();
    assert_eq!(entry.score, 5);
    assert_eq!(h.store.stats().await.unwrap().entries, 1);
    assert_eq!(h.store.stats().await.unwrap().queued, 2);
}
