// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use csutrack_worker::{FetchRequest, Fetcher, HttpFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn plain_response_is_cacheable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/css/app.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/css")
                .set_body_string("body{}"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let response = fetcher
        .fetch(&FetchRequest::get(format!("{}/static/css/app.css", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"body{}");
    assert!(!response.redirected);
    assert!(response.is_cacheable());
    assert!(response
        .headers
        .iter()
        .any(|(k, v)| k == "content-type" && v == "text/css"));
}

#[tokio::test]
async fn followed_redirect_is_flagged_and_not_cacheable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/old.css"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/accounts/login/", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let response = fetcher
        .fetch(&FetchRequest::get(format!("{}/static/old.css", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.redirected);
    assert!(!response.is_cacheable());
}

#[tokio::test]
async fn accept_header_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    fetcher
        .fetch(&FetchRequest::get(format!("{}/static/i.png", server.uri())).with_accept("image/png"))
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_url_is_a_validation_error() {
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let err = fetcher.fetch(&FetchRequest::get("not a url")).await.unwrap_err();
    assert!(matches!(err, csutrack_core::CsuError::Validation(_)));
}
