// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network boundary consumed by the sync engine and form interceptor.

use async_trait::async_trait;

use crate::error::CsuError;
use crate::payload::PayloadEnvelope;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Entry, HttpMethod, SyncQueueItem};

/// REST collaborator the offline layer replays against.
///
/// Every mutating call carries the current CSRF token. Both replay paths
/// must be safe to repeat: entries go to an idempotent per-date upsert, and
/// queued items are only ever replayed as captured.
#[async_trait]
pub trait SyncTransport: PluginAdapter {
    /// Replace-style upsert of a single entry for its date.
    async fn upsert_entry(&self, entry: &Entry) -> Result<(), CsuError>;

    /// Replays a queued mutation exactly as captured.
    async fn replay(&self, item: &SyncQueueItem) -> Result<(), CsuError>;

    /// Sends a live submission (the online path of a form).
    async fn submit(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: &PayloadEnvelope,
    ) -> Result<(), CsuError>;

    /// Replaces the CSRF token attached to subsequent requests.
    fn set_csrf_token(&self, token: Option<String>);
}
