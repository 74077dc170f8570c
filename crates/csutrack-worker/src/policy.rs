// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request interception policy.
//!
//! Rules are checked in a fixed order and the first match decides. Only
//! same-origin GETs for static assets are ever handled; navigations and
//! HTML-accepting requests are never intercepted, whatever their path.

use csutrack_config::model::WorkerConfig;
use csutrack_core::HttpMethod;
use reqwest::Url;

use crate::request::{FetchRequest, RequestMode};

/// Why a request is or is not handled by the cache controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    NonGet,
    CrossOrigin,
    Navigation,
    HtmlDocument,
    Api,
    StaticAsset,
    Other,
}

impl RequestClass {
    /// Only static assets are served by the controller; everything else
    /// falls through to the network untouched.
    pub fn is_intercepted(self) -> bool {
        matches!(self, Self::StaticAsset)
    }
}

pub fn classify(request: &FetchRequest, config: &WorkerConfig) -> RequestClass {
    if request.method != HttpMethod::Get {
        return RequestClass::NonGet;
    }

    let Ok(url) = Url::parse(&request.url) else {
        return RequestClass::CrossOrigin;
    };
    if !same_origin(&url, &config.origin) {
        return RequestClass::CrossOrigin;
    }

    if request.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }
    if request.accepts_html() {
        return RequestClass::HtmlDocument;
    }

    let path = url.path();
    if path.starts_with(&config.api_prefix) {
        RequestClass::Api
    } else if path.starts_with(&config.static_prefix) {
        RequestClass::StaticAsset
    } else {
        RequestClass::Other
    }
}

/// Compares scheme, host and port.
pub fn same_origin(url: &Url, origin: &str) -> bool {
    Url::parse(origin).is_ok_and(|origin| url.origin() == origin.origin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkerConfig {
        WorkerConfig {
            origin: "https://csu.example.org".into(),
            ..WorkerConfig::default()
        }
    }

    #[test]
    fn rules_apply_in_priority_order() {
        let config = config();
        let asset = "https://csu.example.org/static/app.css";

        assert_eq!(
            classify(&FetchRequest::get(asset).with_method(HttpMethod::Post), &config),
            RequestClass::NonGet
        );
        assert_eq!(
            classify(&FetchRequest::get("https://cdn.example.net/static/app.css"), &config),
            RequestClass::CrossOrigin
        );
        assert_eq!(
            classify(&FetchRequest::get(asset).with_mode(RequestMode::Navigate), &config),
            RequestClass::Navigation
        );
        assert_eq!(
            classify(&FetchRequest::get(asset).with_accept("text/html"), &config),
            RequestClass::HtmlDocument
        );
        assert_eq!(
            classify(&FetchRequest::get("https://csu.example.org/api/tracking/entries/"), &config),
            RequestClass::Api
        );
        assert_eq!(classify(&FetchRequest::get(asset), &config), RequestClass::StaticAsset);
        assert_eq!(
            classify(&FetchRequest::get("https://csu.example.org/tracking/"), &config),
            RequestClass::Other
        );
    }

    #[test]
    fn different_port_is_cross_origin() {
        let req = FetchRequest::get("https://csu.example.org:8443/static/app.css");
        assert_eq!(classify(&req, &config()), RequestClass::CrossOrigin);
    }

    #[test]
    fn unparseable_url_is_not_intercepted() {
        let class = classify(&FetchRequest::get("not a url"), &config());
        assert!(!class.is_intercepted());
    }

    #[test]
    fn only_static_assets_are_intercepted() {
        assert!(RequestClass::StaticAsset.is_intercepted());
        for class in [
            RequestClass::NonGet,
            RequestClass::CrossOrigin,
            RequestClass::Navigation,
            RequestClass::HtmlDocument,
            RequestClass::Api,
            RequestClass::Other,
        ] {
            assert!(!class.is_intercepted());
        }
    }
}
