// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the tracking server.
//!
//! Provides [`HttpTransport`], which sends entry upserts and replays queued
//! mutations with a CSRF token and a bounded per-request timeout.
//!
//! A form body that carries its own hidden token field is sent with that
//! token. Every other request uses the token last handed over through
//! `set_csrf_token`, which starts out as the one in the configured session
//! cookie.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use csutrack_config::model::{FormsConfig, SyncConfig};
use csutrack_core::{
    AdapterType, CsuError, Entry, HealthStatus, HttpMethod, MutationBody, PayloadEnvelope,
    PluginAdapter, SyncQueueItem, SyncTransport,
};

use crate::csrf;

/// REST transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    entry_endpoint: String,
    csrf_header: HeaderName,
    csrf_field: String,
    csrf_token: Mutex<Option<String>>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(sync: &SyncConfig, forms: &FormsConfig) -> Result<Self, CsuError> {
        let timeout = Duration::from_secs(sync.request_timeout_secs);
        let csrf_header = HeaderName::from_bytes(forms.csrf_header.as_bytes()).map_err(|e| {
            CsuError::Config(format!("invalid CSRF header name `{}`: {e}", forms.csrf_header))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CsuError::Network {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: sync.server_url.trim_end_matches('/').to_string(),
            entry_endpoint: sync.entry_endpoint.clone(),
            csrf_header,
            csrf_field: forms.csrf_field.clone(),
            csrf_token: Mutex::new(csrf::configured_token(forms)),
            timeout,
        })
    }

    /// Resolves a captured endpoint against the server URL.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    fn entry_url(&self, entry: &Entry) -> String {
        let endpoint = self.entry_endpoint.trim_end_matches('/');
        self.url(&format!("{endpoint}/{}/", entry.date.format("%Y-%m-%d")))
    }

    fn current_token(&self) -> Option<String> {
        self.csrf_token.lock().ok().and_then(|token| token.clone())
    }

    fn map_send_err(&self, e: reqwest::Error) -> CsuError {
        if e.is_timeout() {
            CsuError::Timeout {
                duration: self.timeout,
            }
        } else {
            CsuError::Network {
                message: format!("HTTP request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            }
        }
    }

    /// The form's own hidden token, else the shared one.
    fn token_for(&self, body: Option<&MutationBody>) -> Option<String> {
        match body {
            Some(MutationBody::Form { fields }) => csrf::token_from_fields(fields, &self.csrf_field),
            _ => None,
        }
        .or_else(|| self.current_token())
    }

    async fn send(
        &self,
        url: String,
        method: HttpMethod,
        body: Option<&MutationBody>,
    ) -> Result<(), CsuError> {
        let mut request = self.client.request(to_reqwest_method(method), &url);

        if let Some(token) = self.token_for(body) {
            let value = HeaderValue::from_str(&token)
                .map_err(|e| CsuError::Validation(format!("CSRF token is not a valid header: {e}")))?;
            request = request.header(self.csrf_header.clone(), value);
        }

        request = match body {
            Some(MutationBody::Form { fields }) => request.form(&fields.to_pairs()),
            Some(MutationBody::Json { value }) => request.json(value),
            None => request,
        };

        let response = request.send().await.map_err(|e| self.map_send_err(e))?;
        let status = response.status();
        debug!(%url, %method, status = %status, "server responded");

        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(CsuError::network(
            format!("{method} {url} returned {status}: {}", truncate(&body, 200)),
            Some(status.as_u16()),
        ))
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl PluginAdapter for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, CsuError> {
        match self.client.head(&self.base_url).send().await {
            Ok(response) if response.status().is_server_error() => Ok(HealthStatus::Degraded(
                format!("server returned {}", response.status()),
            )),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), CsuError> {
        Ok(())
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn upsert_entry(&self, entry: &Entry) -> Result<(), CsuError> {
        let body = MutationBody::Json {
            value: serde_json::to_value(entry.upsert_payload()).map_err(|e| {
                CsuError::Internal(format!("failed to encode entry payload: {e}"))
            })?,
        };
        self.send(self.entry_url(entry), HttpMethod::Put, Some(&body))
            .await
    }

    async fn replay(&self, item: &SyncQueueItem) -> Result<(), CsuError> {
        let payload = item.payload()?;
        self.submit(&item.endpoint, item.method, &payload).await
    }

    async fn submit(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: &PayloadEnvelope,
    ) -> Result<(), CsuError> {
        let body = (method != HttpMethod::Get).then_some(&payload.body);
        self.send(self.url(endpoint), method, body).await
    }

    fn set_csrf_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.csrf_token.lock() {
            *current = token;
        }
    }
}
