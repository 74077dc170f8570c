// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock server boundary for deterministic sync tests.
//!
//! `MockTransport` implements `SyncTransport`. Failures are scripted per
//! entry date, per endpoint, for the next N calls, or for every call after
//! the first N successes (a connection dropping mid-pass). An upsert can be
//! held in flight until the test releases it. Every call is recorded for
//! assertions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;

use csutrack_core::{
    AdapterType, CsuError, Entry, HealthStatus, HttpMethod, PayloadEnvelope, PluginAdapter,
    SyncQueueItem, SyncTransport,
};

/// A recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Upsert { date: NaiveDate, ok: bool },
    Replay { id: i64, endpoint: String, ok: bool },
    Submit { endpoint: String, method: HttpMethod, ok: bool },
}

#[derive(Default)]
struct Script {
    failing_dates: HashSet<NaiveDate>,
    failing_endpoints: HashSet<String>,
    fail_next: usize,
    succeed_then_fail: Option<usize>,
    calls: Vec<TransportCall>,
    payloads: Vec<PayloadEnvelope>,
    upserted: Vec<Entry>,
    held_upsert: Option<Arc<CallGate>>,
    csrf_token: Option<String>,
    csrf_seen: Vec<Option<String>>,
}

impl Script {
    /// Decides the fate of the next call and consumes one-shot failures.
    fn next_fails(&mut self) -> bool {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        match self.succeed_then_fail.as_mut() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        }
    }
}

/// Holds one call in flight until [`release`](Self::release).
#[derive(Default)]
pub struct CallGate {
    entered: Notify,
    released: Notify,
}

impl CallGate {
    /// Resolves once the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the held call continue. Its outcome is scripted at that moment.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// A scriptable [`SyncTransport`].
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut script)
    }

    /// Upserts for `date` fail until [`heal_date`](Self::heal_date).
    pub fn fail_date(&self, date: NaiveDate) {
        self.with_script(|s| s.failing_dates.insert(date));
    }

    pub fn heal_date(&self, date: NaiveDate) {
        self.with_script(|s| s.failing_dates.remove(&date));
    }

    /// Replays and submits to `endpoint` fail until healed.
    pub fn fail_endpoint(&self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        self.with_script(|s| s.failing_endpoints.insert(endpoint));
    }

    pub fn heal_endpoint(&self, endpoint: &str) {
        self.with_script(|s| s.failing_endpoints.remove(endpoint));
    }

    /// The next `n` calls fail, whatever they are.
    pub fn fail_next(&self, n: usize) {
        self.with_script(|s| s.fail_next = n);
    }

    /// The next `n` calls succeed, then every call fails until
    /// [`heal_all`](Self::heal_all).
    pub fn drop_connection_after(&self, n: usize) {
        self.with_script(|s| s.succeed_then_fail = Some(n));
    }

    /// The next upsert waits on the returned gate before it is scripted.
    pub fn hold_next_upsert(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::default());
        let held = gate.clone();
        self.with_script(|s| s.held_upsert = Some(held));
        gate
    }

    pub fn heal_all(&self) {
        self.with_script(|s| {
            s.failing_dates.clear();
            s.failing_endpoints.clear();
            s.fail_next = 0;
            s.succeed_then_fail = None;
        });
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.with_script(|s| s.calls.clone())
    }

    pub fn upserted_dates(&self) -> Vec<NaiveDate> {
        self.with_script(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    TransportCall::Upsert { date, ok: true } => Some(*date),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn replayed_ids(&self) -> Vec<i64> {
        self.with_script(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    TransportCall::Replay { id, ok: true, .. } => Some(*id),
                    _ => None,
                })
                .collect()
        })
    }

    /// Entries the server accepted, as sent.
    pub fn upserted_entries(&self) -> Vec<Entry> {
        self.with_script(|s| s.upserted.clone())
    }

    /// Envelopes that were successfully replayed, in order.
    pub fn replayed_payloads(&self) -> Vec<PayloadEnvelope> {
        self.with_script(|s| s.payloads.clone())
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.with_script(|s| s.csrf_token.clone())
    }

    /// Token attached to each recorded call, in call order.
    pub fn csrf_seen(&self) -> Vec<Option<String>> {
        self.with_script(|s| s.csrf_seen.clone())
    }

    pub fn call_count(&self) -> usize {
        self.with_script(|s| s.calls.len())
    }
}

fn scripted_failure(what: &str) -> CsuError {
    CsuError::network(format!("scripted failure: {what}"), Some(503))
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, CsuError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CsuError> {
        Ok(())
    }
}

#[async_trait]
impl SyncTransport for MockTransport {
    async fn upsert_entry(&self, entry: &Entry) -> Result<(), CsuError> {
        if let Some(gate) = self.with_script(|s| s.held_upsert.take()) {
            gate.entered.notify_one();
            gate.released.notified().await;
        }
        self.with_script(|s| {
            let fails = s.next_fails() || s.failing_dates.contains(&entry.date);
            s.calls.push(TransportCall::Upsert {
                date: entry.date,
                ok: !fails,
            });
            let token = s.csrf_token.clone();
            s.csrf_seen.push(token);
            if fails {
                Err(scripted_failure(&format!("upsert {}", entry.date)))
            } else {
                s.upserted.push(entry.clone());
                Ok(())
            }
        })
    }

    async fn replay(&self, item: &SyncQueueItem) -> Result<(), CsuError> {
        let payload = item.payload();
        self.with_script(|s| {
            let scripted = s.next_fails() || s.failing_endpoints.contains(&item.endpoint);
            let outcome = match payload {
                Err(e) => Err(e),
                Ok(_) if scripted => Err(scripted_failure(&format!("replay {}", item.id))),
                Ok(envelope) => {
                    s.payloads.push(envelope);
                    Ok(())
                }
            };
            s.calls.push(TransportCall::Replay {
                id: item.id,
                endpoint: item.endpoint.clone(),
                ok: outcome.is_ok(),
            });
            let token = s.csrf_token.clone();
            s.csrf_seen.push(token);
            outcome
        })
    }

    async fn submit(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: &PayloadEnvelope,
    ) -> Result<(), CsuError> {
        self.with_script(|s| {
            let fails = s.next_fails() || s.failing_endpoints.contains(endpoint);
            s.calls.push(TransportCall::Submit {
                endpoint: endpoint.to_string(),
                method,
                ok: !fails,
            });
            if fails {
                return Err(scripted_failure(&format!("submit {endpoint}")));
            }
            s.payloads.push(payload.clone());
            Ok(())
        })
    }

    fn set_csrf_token(&self, token: Option<String>) {
        self.with_script(|s| s.csrf_token = token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csutrack_core::FormFields;

    fn entry(day: u32) -> Entry {
        Entry {
            date: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            score: 3,
            itch_score: 1,
            hive_score: 2,
            notes: String::new(),
            photo_url: None,
            triggers: Vec::new(),
            qol_data: Default::default(),
            synced: false,
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn per_date_failures_are_sticky_until_healed() {
        let t = MockTransport::new();
        let e = entry(1);
        t.fail_date(e.date);
        assert!(t.upsert_entry(&e).await.is_err());
        assert!(t.upsert_entry(&e).await.is_err());
        t.heal_date(e.date);
        assert!(t.upsert_entry(&e).await.is_ok());
        assert_eq!(t.upserted_dates(), vec![e.date]);
        assert_eq!(t.call_count(), 3);
    }

    #[tokio::test]
    async fn connection_drop_fails_everything_after_n() {
        let t = MockTransport::new();
        t.drop_connection_after(1);
        assert!(t.upsert_entry(&entry(1)).await.is_ok());
        assert!(t.upsert_entry(&entry(2)).await.is_err());
        assert!(t.upsert_entry(&entry(3)).await.is_err());
        t.heal_all();
        assert!(t.upsert_entry(&entry(3)).await.is_ok());
    }

    #[tokio::test]
    async fn held_upsert_is_scripted_on_release() {
        let t = Arc::new(MockTransport::new());
        let gate = t.hold_next_upsert();
        let call = tokio::spawn({
            let t = t.clone();
            async move { t.upsert_entry(&entry(1)).await }
        });

        gate.entered().await;
        t.fail_next(1);
        gate.release();

        assert!(call.await.unwrap().is_err());
        assert!(t.upsert_entry(&entry(1)).await.is_ok());
        assert_eq!(t.upserted_entries().len(), 1);
    }

    #[tokio::test]
    async fn submit_records_payload() {
        let t = MockTransport::new();
        let payload = PayloadEnvelope::form(FormFields::from_pairs([("a", "1")]));
        t.submit("/x/", HttpMethod::Post, &payload).await.unwrap();
        assert_eq!(t.replayed_payloads(), vec![payload]);
    }
}
