// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host fakes for the worker context: network, windows and notifications.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use csutrack_core::{AdapterType, CsuError, HealthStatus, PluginAdapter};
use csutrack_worker::push::Notification;
use csutrack_worker::{ClientWindow, Clients, FetchRequest, FetchResponse, Fetcher, NotificationSink};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// A [`Fetcher`] serving canned responses. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    unreachable: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: FetchResponse) {
        lock(&self.responses).insert(response.url.clone(), response);
    }

    /// Serves a clean 200 with `body` at `url`.
    pub fn serve(&self, url: &str, body: &str) {
        self.respond(FetchResponse::ok(url, body));
    }

    /// Requests for `url` fail as if the network were down.
    pub fn fail(&self, url: &str) {
        lock(&self.unreachable).insert(url.to_string());
    }

    /// Every URL fetched, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        lock(&self.requests).iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PluginAdapter for MockFetcher {
    fn name(&self) -> &str {
        "mock-fetcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Fetcher
    }

    async fn health_check(&self) -> Result<HealthStatus, CsuError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CsuError> {
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CsuError> {
        lock(&self.requests).push(request.url.clone());
        if lock(&self.unreachable).contains(&request.url) {
            return Err(CsuError::network(
                format!("{} unreachable", request.url),
                None,
            ));
        }
        Ok(lock(&self.responses)
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| FetchResponse {
                status: 404,
                ..FetchResponse::ok(&request.url, "")
            }))
    }
}

/// A recorded window operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Navigate { id: String, url: String },
    Focus { id: String },
    Open { url: String },
    Claim,
}

#[derive(Default)]
pub struct MockClients {
    windows: Mutex<Vec<ClientWindow>>,
    calls: Mutex<Vec<ClientCall>>,
}

impl MockClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already-open, unfocused window.
    pub fn with_window(self, id: &str, url: &str) -> Self {
        lock(&self.windows).push(ClientWindow {
            id: id.to_string(),
            url: url.to_string(),
            focused: false,
        });
        self
    }

    pub fn windows(&self) -> Vec<ClientWindow> {
        lock(&self.windows).clone()
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl Clients for MockClients {
    async fn match_all(&self) -> Result<Vec<ClientWindow>, CsuError> {
        Ok(self.windows())
    }

    async fn navigate(&self, id: &str, url: &str) -> Result<(), CsuError> {
        let mut windows = lock(&self.windows);
        let window = windows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| CsuError::Internal(format!("no window {id}")))?;
        window.url = url.to_string();
        lock(&self.calls).push(ClientCall::Navigate {
            id: id.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }

    async fn focus(&self, id: &str) -> Result<(), CsuError> {
        for window in lock(&self.windows).iter_mut() {
            window.focused = window.id == id;
        }
        lock(&self.calls).push(ClientCall::Focus { id: id.to_string() });
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<String, CsuError> {
        let mut windows = lock(&self.windows);
        let id = format!("window-{}", windows.len() + 1);
        for window in windows.iter_mut() {
            window.focused = false;
        }
        windows.push(ClientWindow {
            id: id.clone(),
            url: url.to_string(),
            focused: true,
        });
        lock(&self.calls).push(ClientCall::Open {
            url: url.to_string(),
        });
        Ok(id)
    }

    async fn claim(&self) -> Result<(), CsuError> {
        lock(&self.calls).push(ClientCall::Claim);
        Ok(())
    }
}

/// Notification sink that keeps what was shown and closed.
#[derive(Default)]
pub struct MemoryNotificationSink {
    shown: Mutex<Vec<Notification>>,
    closed: Mutex<Vec<String>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Notification> {
        lock(&self.shown).clone()
    }

    pub fn closed(&self) -> Vec<String> {
        lock(&self.closed).clone()
    }
}

impl NotificationSink for MemoryNotificationSink {
    fn show(&self, notification: &Notification) {
        lock(&self.shown).push(notification.clone());
    }

    fn close(&self, tag: &str) {
        lock(&self.closed).push(tag.to_string());
    }
}
