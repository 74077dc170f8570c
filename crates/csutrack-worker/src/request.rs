// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response values seen by the fetch handler.

use csutrack_core::HttpMethod;
use strum::Display;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RequestMode {
    /// A top-level document load.
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    pub mode: RequestMode,
    /// Value of the `Accept` header, if any.
    pub accept: Option<String>,
}

impl FetchRequest {
    /// A plain same-origin GET for a subresource.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            mode: RequestMode::SameOrigin,
            accept: None,
        }
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// True when the `Accept` header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.to_ascii_lowercase().contains("text/html"))
    }
}

/// Response classification, mirroring what a fetch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResponseType {
    Basic,
    Cors,
    Opaque,
    #[strum(serialize = "opaqueredirect")]
    OpaqueRedirect,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// The response was reached by following at least one redirect.
    pub redirected: bool,
    pub response_type: ResponseType,
}

impl FetchResponse {
    /// A plain same-origin 200 response.
    pub fn ok(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            headers: Vec::new(),
            body: body.into(),
            redirected: false,
            response_type: ResponseType::Basic,
        }
    }

    /// Only a clean 200 may be written to the cache: not redirected and not
    /// an opaque redirect.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && !self.redirected && self.response_type != ResponseType::OpaqueRedirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_accept_detection_is_case_insensitive() {
        let req = FetchRequest::get("https://a.test/").with_accept("Text/HTML,application/xhtml+xml");
        assert!(req.accepts_html());
        assert!(!FetchRequest::get("https://a.test/").with_accept("image/png").accepts_html());
        assert!(!FetchRequest::get("https://a.test/").accepts_html());
    }

    #[test]
    fn only_clean_200s_are_cacheable() {
        let ok = FetchResponse::ok("https://a.test/static/a.css", "body");
        assert!(ok.is_cacheable());

        let redirected = FetchResponse {
            redirected: true,
            ..ok.clone()
        };
        assert!(!redirected.is_cacheable());

        let opaque = FetchResponse {
            response_type: ResponseType::OpaqueRedirect,
            status: 0,
            ..ok.clone()
        };
        assert!(!opaque.is_cacheable());

        let not_found = FetchResponse { status: 404, ..ok };
        assert!(!not_found.is_cacheable());
        assert_eq!(ResponseType::OpaqueRedirect.to_string(), "opaqueredirect");
    }
}
