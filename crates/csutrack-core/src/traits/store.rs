// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local store trait: durable client-side persistence for entries, the sync
//! queue, and cached user data and pages.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CsuError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CachedPage, CachedUserData, DeadLetter, Entry, EntryDraft, HttpMethod, ResetOutcome,
    RetryOutcome, StoreStats, SyncQueueItem,
};

/// The only owner of entries, queue items, and cached records.
///
/// Absent records are `Ok(None)`. I/O failures surface as
/// [`CsuError::Storage`]; damaged records found while scanning surface as
/// [`CsuError::Corruption`], which callers answer with
/// [`reset_database`](LocalStore::reset_database).
#[async_trait]
pub trait LocalStore: PluginAdapter {
    /// Opens (creating and upgrading as needed) the versioned store.
    ///
    /// A failure here is terminal for the session: later calls keep
    /// returning [`CsuError::StoreUnavailable`].
    async fn init(&self) -> Result<(), CsuError>;

    /// Flushes pending writes and releases the handle.
    async fn close(&self) -> Result<(), CsuError>;

    // --- Entries ---

    /// Validates, stamps `synced = false` and a fresh `updated_at`, and
    /// replaces any record for the same date.
    async fn save_entry(&self, draft: EntryDraft) -> Result<Entry, CsuError>;

    async fn get_entry(&self, date: NaiveDate) -> Result<Option<Entry>, CsuError>;

    /// Inclusive range scan ordered by date ascending.
    async fn get_entries(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>, CsuError>;

    /// All entries with `synced = false`, found by a full scan.
    async fn get_unsynced_entries(&self) -> Result<Vec<Entry>, CsuError>;

    /// Sets `synced = true` on the version of the entry stamped `updated_at`.
    ///
    /// Returns false, without changing anything, when the entry is gone or
    /// was saved again after that version was read.
    async fn mark_entry_synced(
        &self,
        date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CsuError>;

    // --- Sync queue ---

    /// Appends a mutation with `retries = 0` and returns its id.
    async fn queue_for_sync(
        &self,
        endpoint: &str,
        method: HttpMethod,
        data: Vec<u8>,
    ) -> Result<i64, CsuError>;

    /// Current queue contents, read fresh from storage, oldest first.
    async fn get_sync_queue(&self) -> Result<Vec<SyncQueueItem>, CsuError>;

    async fn remove_from_queue(&self, id: i64) -> Result<(), CsuError>;

    /// Records a failed replay; evicts the item once the retry bound is exceeded.
    async fn increment_retry_count(&self, id: i64) -> Result<RetryOutcome, CsuError>;

    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>, CsuError>;

    // --- Cached data ---

    async fn cache_user_data(&self, key: &str, data: serde_json::Value) -> Result<(), CsuError>;

    async fn get_cached_user_data(&self, key: &str) -> Result<Option<CachedUserData>, CsuError>;

    async fn cache_page(&self, url: &str, html: &str) -> Result<(), CsuError>;

    async fn get_cached_page(&self, url: &str) -> Result<Option<CachedPage>, CsuError>;

    // --- Maintenance ---

    async fn stats(&self) -> Result<StoreStats, CsuError>;

    /// Destroys and recreates the store. Re-entrant calls while a reset is
    /// running return [`ResetOutcome::AlreadyInProgress`].
    async fn reset_database(&self, reason: &str) -> Result<ResetOutcome, CsuError>;
}
