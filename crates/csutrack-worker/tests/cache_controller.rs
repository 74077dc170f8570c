// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use csutrack_config::model::WorkerConfig;
use csutrack_core::HttpMethod;
use csutrack_test_utils::{ClientCall, MockClients, MockFetcher};
use csutrack_worker::{
    CacheController, CacheStorage, FetchRequest, FetchResponse, MemoryCacheStorage, RequestMode,
    ResponseType, WorkerState,
};

const ORIGIN: &str = "https://csu.example.org";

fn config(version: &str) -> WorkerConfig {
    WorkerConfig {
        cache_version: version.to_string(),
        origin: ORIGIN.to_string(),
        precache: vec!["/static/css/app.css".into(), "/static/js/app.js".into()],
        ..WorkerConfig::default()
    }
}

fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

struct Fixture {
    cache: Arc<MemoryCacheStorage>,
    fetcher: Arc<MockFetcher>,
    clients: Arc<MockClients>,
}

impl Fixture {
    fn new() -> Self {
        let fetcher = MockFetcher::new();
        for path in ["/static/css/app.css", "/static/js/app.js", "/offline/"] {
            fetcher.serve(&url(path), path);
        }
        Self {
            cache: Arc::new(MemoryCacheStorage::new()),
            fetcher: Arc::new(fetcher),
            clients: Arc::new(MockClients::new()),
        }
    }

    fn controller(&self, version: &str) -> CacheController {
        CacheController::new(
            config(version),
            self.cache.clone(),
            self.fetcher.clone(),
            self.clients.clone(),
        )
    }
}

async fn activated(fixture: &Fixture, version: &str) -> CacheController {
    let controller = fixture.controller(version);
    controller.install().await.unwrap();
    controller.activate().await.unwrap();
    controller
}

#[tokio::test]
async fn install_precaches_manifest_and_offline_page() {
    let f = Fixture::new();
    let controller = f.controller("v1");
    assert_eq!(controller.state().await, WorkerState::Parsed);

    let report = controller.install().await.unwrap();
    assert_eq!(report.cached.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(controller.state().await, WorkerState::Installed);
    assert_eq!(f.cache.len("v1").await, 3);
    assert!(f.cache.lookup("v1", &url("/offline/")).await.unwrap().is_some());
}

#[tokio::test]
async fn install_tolerates_individual_asset_failures() {
    let f = Fixture::new();
    f.fetcher.fail(&url("/static/js/app.js"));
    f.fetcher.respond(FetchResponse {
        redirected: true,
        ..FetchResponse::ok(url("/offline/"), "login page")
    });

    let controller = f.controller("v1");
    let report = controller.install().await.unwrap();

    assert_eq!(report.cached, vec!["/static/css/app.css".to_string()]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(controller.state().await, WorkerState::Installed);
    assert_eq!(f.cache.len("v1").await, 1);
}

#[tokio::test]
async fn activation_deletes_other_generations_and_claims() {
    let f = Fixture::new();
    f.cache.create("csu-tracker-static-v0").await;
    let _v1 = activated(&f, "v1").await;

    let v2 = f.controller("v2");
    v2.install().await.unwrap();
    // Both generations coexist until the new controller activates.
    assert_eq!(f.cache.keys().await.unwrap().len(), 2);

    let mut deleted = v2.activate().await.unwrap();
    deleted.sort();
    assert_eq!(deleted, vec!["v1".to_string()]);
    assert_eq!(f.cache.keys().await.unwrap(), vec!["v2".to_string()]);
    assert_eq!(v2.state().await, WorkerState::Activated);
    assert!(f.clients.calls().contains(&ClientCall::Claim));
}

#[tokio::test]
async fn stale_generation_is_never_served_after_upgrade() {
    let f = Fixture::new();
    let v1 = activated(&f, "v1").await;
    let css = FetchRequest::get(url("/static/css/app.css"));
    assert_eq!(v1.handle_fetch(&css).await.unwrap().unwrap().body, b"/static/css/app.css");

    f.fetcher.serve(&url("/static/css/app.css"), "new css");
    let v2 = activated(&f, "v2").await;
    v1.mark_redundant().await;

    let served = v2.handle_fetch(&css).await.unwrap().unwrap();
    assert_eq!(served.body, b"new css");
    assert!(v1.handle_fetch(&css).await.unwrap().is_none());
}

#[tokio::test]
async fn nothing_is_intercepted_before_activation() {
    let f = Fixture::new();
    let controller = f.controller("v1");
    controller.install().await.unwrap();
    let css = FetchRequest::get(url("/static/css/app.css"));
    assert!(controller.handle_fetch(&css).await.unwrap().is_none());
}

#[tokio::test]
async fn static_miss_goes_to_network_and_fills_cache() {
    let f = Fixture::new();
    let controller = activated(&f, "v1").await;
    let logo = url("/static/img/logo.svg");
    f.fetcher.serve(&logo, "<svg/>");

    let first = controller
        .handle_fetch(&FetchRequest::get(&logo))
        .await
        .unwrap()
        .unwrap();
    let second = controller
        .handle_fetch(&FetchRequest::get(&logo))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.body, second.body);
    assert_eq!(f.fetcher.request_count(&logo), 1);
}

#[tokio::test]
async fn redirected_and_opaque_responses_are_served_but_not_cached() {
    let f = Fixture::new();
    let controller = activated(&f, "v1").await;
    let redirected = url("/static/moved.css");
    let opaque = url("/static/opaque.css");
    f.fetcher.respond(FetchResponse {
        redirected: true,
        ..FetchResponse::ok(&redirected, "elsewhere")
    });
    f.fetcher.respond(FetchResponse {
        status: 0,
        response_type: ResponseType::OpaqueRedirect,
        ..FetchResponse::ok(&opaque, "")
    });

    for target in [&redirected, &opaque] {
        let req = FetchRequest::get(target);
        assert!(controller.handle_fetch(&req).await.unwrap().is_some());
        assert!(controller.handle_fetch(&req).await.unwrap().is_some());
        assert_eq!(f.fetcher.request_count(target), 2);
        assert!(f.cache.lookup("v1", target).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn documents_are_never_served_from_cache() {
    let f = Fixture::new();
    let controller = activated(&f, "v1").await;
    // Even a stale entry under a static path is ignored for documents.
    let page = url("/static/docs/index.html");
    f.cache
        .put("v1", &page, FetchResponse::ok(&page, "stale document"))
        .await
        .unwrap();

    let navigation = FetchRequest::get(&page).with_mode(RequestMode::Navigate);
    let html = FetchRequest::get(&page).with_accept("text/html,application/xhtml+xml");
    let dashboard = FetchRequest::get(url("/tracking/"));
    let api = FetchRequest::get(url("/api/tracking/entries/"));
    let post = FetchRequest::get(url("/static/css/app.css")).with_method(HttpMethod::Post);
    let foreign = FetchRequest::get("https://cdn.example.net/static/lib.js");

    for request in [navigation, html, dashboard, api, post, foreign] {
        assert!(
            controller.handle_fetch(&request).await.unwrap().is_none(),
            "{} {:?} should pass through",
            request.url,
            request.mode
        );
    }
    assert!(f.fetcher.requests().iter().all(|u| !u.contains("index.html")));
}
