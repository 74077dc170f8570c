// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drains locally pending state to the server.
//!
//! A pass has no global transaction. Every entry and every queued mutation
//! succeeds or fails on its own, so a connection dropping halfway leaves the
//! already-replayed items done and the rest pending for the next pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use csutrack_core::{CsuError, LocalStore, RetryOutcome, SyncTransport};

use crate::connectivity::ConnectivityMonitor;
use crate::csrf;

/// How a pass ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every pending item was attempted.
    #[default]
    Completed,
    /// The monitor reported offline; nothing was attempted.
    SkippedOffline,
    /// Another pass was already running.
    SkippedInProgress,
    /// Corruption was found while scanning; the store was reset and the
    /// pass aborted.
    StoreReset,
}

/// Per-pass counts for progress reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub entries_synced: usize,
    pub entries_failed: usize,
    pub items_replayed: usize,
    pub items_failed: usize,
    pub items_evicted: usize,
}

impl SyncReport {
    fn ended(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    /// True when something was left for a later pass.
    pub fn has_failures(&self) -> bool {
        self.entries_failed > 0 || self.items_failed > 0
    }

    /// Folds a follow-up pass into this one. Successes add up; the outcome
    /// and failure counts are the follow-up's, since it retried what failed.
    fn absorb(&mut self, next: SyncReport) {
        self.outcome = next.outcome;
        self.entries_synced += next.entries_synced;
        self.entries_failed = next.entries_failed;
        self.items_replayed += next.items_replayed;
        self.items_failed = next.items_failed;
        self.items_evicted += next.items_evicted;
    }
}

/// Clears the in-progress flag when the pass ends, however it ends.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reconciles unsynced entries and queued mutations with the server.
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    transport: Arc<dyn SyncTransport>,
    monitor: ConnectivityMonitor,
    in_progress: AtomicBool,
    /// Set by a caller that found a pass running; the runner goes again.
    rerun_requested: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        transport: Arc<dyn SyncTransport>,
        monitor: ConnectivityMonitor,
    ) -> Self {
        Self {
            store,
            transport,
            monitor,
            in_progress: AtomicBool::new(false),
            rerun_requested: AtomicBool::new(false),
        }
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Runs one drain pass.
    ///
    /// A call that finds another pass running returns `SkippedInProgress`
    /// and leaves a rerun request behind: the running pass starts over once
    /// it finishes, so nothing that failed during it waits for the next
    /// connectivity change.
    ///
    /// Only whole-pass failures are returned as errors: a non-corruption
    /// failure to scan entries or to reload the queue. Per-item failures are
    /// logged and counted in the report.
    pub async fn sync_pending_items(&self) -> Result<SyncReport, CsuError> {
        if !self.monitor.is_online() {
            debug!("offline, sync pass skipped");
            return Ok(SyncReport::ended(SyncOutcome::SkippedOffline));
        }

        let mut report: Option<SyncReport> = None;
        loop {
            let guard = match PassGuard::acquire(&self.in_progress) {
                Some(guard) => guard,
                // Another caller took over the rerun.
                None if report.is_some() => break,
                None => {
                    self.rerun_requested.store(true, Ordering::Release);
                    // The running pass may have ended before seeing the request.
                    match PassGuard::acquire(&self.in_progress) {
                        Some(guard) => guard,
                        None => {
                            debug!("sync pass already running, rerun requested");
                            return Ok(SyncReport::ended(SyncOutcome::SkippedInProgress));
                        }
                    }
                }
            };
            // This pass reads everything fresh, which satisfies earlier requests.
            self.rerun_requested.store(false, Ordering::Release);
            let pass = self.drain().await;
            drop(guard);
            let pass = pass?;

            let outcome = pass.outcome;
            match report.as_mut() {
                Some(total) => total.absorb(pass),
                None => report = Some(pass),
            }

            if outcome == SyncOutcome::StoreReset
                || !self.rerun_requested.swap(false, Ordering::AcqRel)
            {
                break;
            }
            if !self.monitor.is_online() {
                debug!("went offline before the requested rerun");
                break;
            }
            debug!("rerunning sync pass requested while it ran");
        }

        Ok(report.unwrap_or_else(|| SyncReport::ended(SyncOutcome::SkippedInProgress)))
    }

    async fn drain(&self) -> Result<SyncReport, CsuError> {
        let entries = match self.store.get_unsynced_entries().await {
            Ok(entries) => entries,
            Err(e) if e.is_corruption() => {
                error!(error = %e, "corrupt record found while scanning unsynced entries");
                self.store
                    .reset_database(&format!("corruption while scanning unsynced entries: {e}"))
                    .await?;
                return Ok(SyncReport::ended(SyncOutcome::StoreReset));
            }
            Err(e) => return Err(e),
        };

        self.restore_csrf_token().await;
        let mut report = SyncReport::default();

        for entry in entries {
            match self.transport.upsert_entry(&entry).await {
                Ok(()) => match self.store.mark_entry_synced(entry.date, entry.updated_at).await {
                    Ok(true) => report.entries_synced += 1,
                    Ok(false) => {
                        debug!(date = %entry.date, "entry changed during upload, left for the next pass");
                    }
                    Err(e) => {
                        warn!(date = %entry.date, error = %e, "entry synced but not marked locally");
                        report.entries_failed += 1;
                    }
                },
                Err(e) => {
                    warn!(date = %entry.date, error = %e, "entry sync failed");
                    report.entries_failed += 1;
                }
            }
        }

        // Read fresh: the interceptor may have queued more while entries synced.
        let queue = self.store.get_sync_queue().await?;

        for item in queue {
            match self.transport.replay(&item).await {
                Ok(()) => {
                    if let Err(e) = self.store.remove_from_queue(item.id).await {
                        // Replays are idempotent; the next pass sends it again.
                        warn!(id = item.id, error = %e, "replayed item could not be dequeued");
                        report.items_failed += 1;
                    } else {
                        report.items_replayed += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        id = item.id,
                        endpoint = %item.endpoint,
                        retries = item.retries,
                        error = %e,
                        "queued mutation replay failed"
                    );
                    match self.store.increment_retry_count(item.id).await {
                        Ok(RetryOutcome::Evicted { .. }) => report.items_evicted += 1,
                        Ok(RetryOutcome::Retrying { .. } | RetryOutcome::Missing) => {
                            report.items_failed += 1
                        }
                        Err(e) => {
                            warn!(id = item.id, error = %e, "failed to record replay retry");
                            report.items_failed += 1;
                        }
                    }
                }
            }
        }

        info!(
            entries_synced = report.entries_synced,
            entries_failed = report.entries_failed,
            items_replayed = report.items_replayed,
            items_failed = report.items_failed,
            items_evicted = report.items_evicted,
            "sync pass finished"
        );
        Ok(report)
    }

    /// Hands the last token captured from a form to the transport, so a
    /// pass in a later session still authenticates its writes.
    async fn restore_csrf_token(&self) {
        match self.store.get_cached_user_data(csrf::CSRF_TOKEN_KEY).await {
            Ok(Some(cached)) => {
                if let Some(token) = cached.data.as_str().filter(|t| !t.is_empty()) {
                    self.transport.set_csrf_token(Some(token.to_string()));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "stored CSRF token could not be read"),
        }
    }
}
