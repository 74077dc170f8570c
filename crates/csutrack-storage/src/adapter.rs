// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the LocalStore trait.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use csutrack_config::model::StorageConfig;
use csutrack_core::{
    AdapterType, CachedPage, CachedUserData, CsuError, DeadLetter, Entry, EntryDraft,
    HealthStatus, HttpMethod, LocalStore, PluginAdapter, ResetOutcome, RetryOutcome, StoreStats,
    SyncQueueItem,
};

use crate::database::Database;
use crate::queries;
use crate::queries::sync_queue::RetryPolicy;

enum StoreState {
    Uninitialized,
    Open(Database),
    /// `init` failed; the store stays unusable for the rest of the session.
    Unavailable(String),
    Closed,
}

/// SQLite-backed local store.
///
/// The database is opened by [`LocalStore::init`]. An open failure is
/// terminal: every later call reports [`CsuError::StoreUnavailable`] and the
/// caller degrades to online-only operation.
pub struct SqliteStore {
    path: PathBuf,
    wal_mode: bool,
    policy: RetryPolicy,
    state: RwLock<StoreState>,
    resetting: AtomicBool,
    /// In-memory copy of the queue for display. Never read by the sync engine.
    pending: Mutex<Vec<SyncQueueItem>>,
}

impl SqliteStore {
    /// Create a new store with the given configuration.
    ///
    /// The database is not opened until [`LocalStore::init`] is called.
    pub fn new(config: StorageConfig, policy: RetryPolicy) -> Self {
        Self {
            path: PathBuf::from(config.database_path),
            wal_mode: config.wal_mode,
            policy,
            state: RwLock::new(StoreState::Uninitialized),
            resetting: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Snapshot of the queue as last seen by this store.
    pub fn pending_snapshot(&self) -> Vec<SyncQueueItem> {
        self.pending
            .lock()
            .map(|pending| pending.clone())
            .unwrap_or_default()
    }

    /// Returns a handle to the open database, or the reason it is not usable.
    async fn db(&self) -> Result<Database, CsuError> {
        match &*self.state.read().await {
            StoreState::Open(db) => Ok(db.clone()),
            StoreState::Unavailable(reason) => Err(CsuError::StoreUnavailable(reason.clone())),
            StoreState::Uninitialized => Err(CsuError::StoreUnavailable(
                "store not initialized, call init() first".into(),
            )),
            StoreState::Closed => Err(CsuError::StoreUnavailable("store is closed".into())),
        }
    }

    fn update_pending(&self, f: impl FnOnce(&mut Vec<SyncQueueItem>)) {
        if let Ok(mut pending) = self.pending.lock() {
            f(&mut pending);
        }
    }

    /// Removes the database file and its WAL companions.
    fn remove_files(&self) -> Result<(), CsuError> {
        let mut companions = Vec::with_capacity(3);
        companions.push(self.path.clone());
        for suffix in ["-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            companions.push(PathBuf::from(name));
        }
        for file in companions {
            match std::fs::remove_file(&file) {
                Ok(()) => debug!(path = %file.display(), "removed store file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CsuError::Storage {
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }

    async fn perform_reset(&self, reason: &str) -> Result<(), CsuError> {
        let mut state = self.state.write().await;
        if let StoreState::Open(db) = std::mem::replace(&mut *state, StoreState::Closed)
            && let Err(e) = db.close().await
        {
            // A corrupt file may refuse the checkpoint; it is deleted next anyway.
            warn!(error = %e, "failed to close store before reset");
        }

        if let Err(e) = self.remove_files() {
            // The old file is still on disk; reopening it would bring the damage back.
            *state = StoreState::Unavailable(format!("store files could not be removed: {e}"));
            error!(reason, error = %e, "local store reset failed; store is unavailable");
            return Err(e);
        }
        self.update_pending(Vec::clear);

        match Database::open(&self.path, self.wal_mode).await {
            Ok(db) => {
                *state = StoreState::Open(db);
                error!(
                    reason,
                    path = %self.path.display(),
                    "local store was destroyed and recreated; unsynced local data has been lost"
                );
                Ok(())
            }
            Err(e) => {
                *state = StoreState::Unavailable(format!("reopen after reset failed: {e}"));
                error!(reason, error = %e, "local store reset failed; store is unavailable");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CsuError> {
        let db = match self.db().await {
            Ok(db) => db,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        if self.resetting.load(Ordering::Acquire) {
            return Ok(HealthStatus::Degraded("reset in progress".into()));
        }
        match db.run(|conn| conn.execute_batch("SELECT 1;")).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), CsuError> {
        LocalStore::close(self).await
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn init(&self) -> Result<(), CsuError> {
        let mut state = self.state.write().await;
        match &*state {
            StoreState::Open(_) => return Ok(()),
            StoreState::Unavailable(reason) => {
                return Err(CsuError::StoreUnavailable(reason.clone()));
            }
            StoreState::Uninitialized | StoreState::Closed => {}
        }

        match Database::open(&self.path, self.wal_mode).await {
            Ok(db) => {
                match queries::sync_queue::list(&db).await {
                    Ok(queue) => self.update_pending(|pending| *pending = queue),
                    Err(e) => warn!(error = %e, "pending queue could not be loaded for display"),
                }
                *state = StoreState::Open(db);
                info!(path = %self.path.display(), "local store opened");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                error!(
                    path = %self.path.display(),
                    error = %reason,
                    "local store unavailable; falling back to online-only operation"
                );
                *state = StoreState::Unavailable(reason.clone());
                Err(CsuError::StoreUnavailable(reason))
            }
        }
    }

    async fn close(&self) -> Result<(), CsuError> {
        let mut state = self.state.write().await;
        // An unavailable store stays unavailable across close.
        if matches!(&*state, StoreState::Open(_))
            && let StoreState::Open(db) = std::mem::replace(&mut *state, StoreState::Closed)
        {
            db.close().await?;
            debug!("local store closed");
        }
        Ok(())
    }

    async fn save_entry(&self, draft: EntryDraft) -> Result<Entry, CsuError> {
        draft.validate()?;
        let db = self.db().await?;
        // Stored stamps keep microseconds; the returned record must match.
        let entry = draft.into_entry(Utc::now().trunc_subsecs(6));
        queries::entries::upsert_entry(&db, &entry).await?;
        debug!(date = %entry.date, score = entry.score, "entry saved locally");
        Ok(entry)
    }

    async fn get_entry(&self, date: NaiveDate) -> Result<Option<Entry>, CsuError> {
        queries::entries::get_entry(&self.db().await?, date).await
    }

    async fn get_entries(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>, CsuError> {
        queries::entries::get_entries_in_range(&self.db().await?, start, end).await
    }

    async fn get_unsynced_entries(&self) -> Result<Vec<Entry>, CsuError> {
        let all = queries::entries::scan_entries(&self.db().await?).await?;
        Ok(all.into_iter().filter(|entry| !entry.synced).collect())
    }

    async fn mark_entry_synced(
        &self,
        date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CsuError> {
        let marked = queries::entries::mark_synced(&self.db().await?, date, updated_at).await?;
        if !marked {
            debug!(%date, "entry was removed or saved again before it could be marked synced");
        }
        Ok(marked)
    }

    async fn queue_for_sync(
        &self,
        endpoint: &str,
        method: HttpMethod,
        data: Vec<u8>,
    ) -> Result<i64, CsuError> {
        let db = self.db().await?;
        let created_at = Utc::now();
        let id =
            queries::sync_queue::enqueue(&db, endpoint, method, data.clone(), created_at).await?;
        self.update_pending(|pending| {
            pending.push(SyncQueueItem {
                id,
                endpoint: endpoint.to_string(),
                method,
                data,
                created_at,
                retries: 0,
            })
        });
        debug!(id, endpoint, %method, "mutation queued for sync");
        Ok(id)
    }

    async fn get_sync_queue(&self) -> Result<Vec<SyncQueueItem>, CsuError> {
        let queue = queries::sync_queue::list(&self.db().await?).await?;
        let snapshot = queue.clone();
        self.update_pending(|pending| *pending = snapshot);
        Ok(queue)
    }

    async fn remove_from_queue(&self, id: i64) -> Result<(), CsuError> {
        queries::sync_queue::remove(&self.db().await?, id).await?;
        self.update_pending(|pending| pending.retain(|item| item.id != id));
        Ok(())
    }

    async fn increment_retry_count(&self, id: i64) -> Result<RetryOutcome, CsuError> {
        let db = self.db().await?;
        let outcome = queries::sync_queue::increment_retry(&db, id, self.policy, Utc::now()).await?;
        match outcome {
            RetryOutcome::Retrying { retries } => self.update_pending(|pending| {
                if let Some(item) = pending.iter_mut().find(|item| item.id == id) {
                    item.retries = retries;
                }
            }),
            RetryOutcome::Evicted { retries } => {
                self.update_pending(|pending| pending.retain(|item| item.id != id));
                warn!(
                    id,
                    retries,
                    dead_letter = self.policy.dead_letter,
                    "queued mutation exceeded retry bound and was evicted"
                );
            }
            RetryOutcome::Missing => debug!(id, "retry recorded for an item no longer queued"),
        }
        Ok(outcome)
    }

    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>, CsuError> {
        queries::sync_queue::list_dead_letters(&self.db().await?).await
    }

    async fn cache_user_data(&self, key: &str, data: serde_json::Value) -> Result<(), CsuError> {
        queries::cache::put_user_data(&self.db().await?, key, &data, Utc::now()).await
    }

    async fn get_cached_user_data(&self, key: &str) -> Result<Option<CachedUserData>, CsuError> {
        queries::cache::get_user_data(&self.db().await?, key).await
    }

    async fn cache_page(&self, url: &str, html: &str) -> Result<(), CsuError> {
        queries::cache::put_page(&self.db().await?, url, html, Utc::now()).await
    }

    async fn get_cached_page(&self, url: &str) -> Result<Option<CachedPage>, CsuError> {
        queries::cache::get_page(&self.db().await?, url).await
    }

    async fn stats(&self) -> Result<StoreStats, CsuError> {
        let db = self.db().await?;
        Ok(StoreStats {
            entries: queries::entries::count_entries(&db).await?,
            unsynced_entries: queries::entries::count_unsynced(&db).await?,
            queued: queries::sync_queue::count_queued(&db).await?,
            dead_letters: queries::sync_queue::count_dead_letters(&db).await?,
        })
    }

    async fn reset_database(&self, reason: &str) -> Result<ResetOutcome, CsuError> {
        if self
            .resetting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(reason, "store reset already in progress; ignoring");
            return Ok(ResetOutcome::AlreadyInProgress);
        }

        warn!(reason, path = %self.path.display(), "resetting local store");
        let result = self.perform_reset(reason).await;
        self.resetting.store(false, Ordering::Release);
        result.map(|()| ResetOutcome::Completed)
    }
}
