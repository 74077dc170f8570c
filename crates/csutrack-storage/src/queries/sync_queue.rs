// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync queue operations: append, fresh reads, removal, and bounded retries.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use csutrack_core::{CsuError, DeadLetter, HttpMethod, RetryOutcome, SyncQueueItem};
use rusqlite::params;
use rusqlite::types::Type;

use super::{conversion_failure, parse_timestamp, timestamp};
use crate::database::Database;

/// What happens to an item whose retries exceed the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Highest retry count an item may keep; one more failure evicts it.
    pub max_retries: u32,
    /// Move evicted items to `dead_letters` instead of discarding them.
    pub dead_letter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            dead_letter: true,
        }
    }
}

impl From<&csutrack_config::model::SyncConfig> for RetryPolicy {
    fn from(config: &csutrack_config::model::SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            dead_letter: config.dead_letter,
        }
    }
}

fn parse_method(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<HttpMethod> {
    let raw: String = row.get(idx)?;
    HttpMethod::from_str(&raw).map_err(|e| conversion_failure(idx, Type::Text, e))
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncQueueItem> {
    Ok(SyncQueueItem {
        id: row.get(0)?,
        endpoint: row.get(1)?,
        method: parse_method(row, 2)?,
        data: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
        retries: row.get(5)?,
    })
}

/// Append a mutation with `retries = 0`. Returns the assigned id.
pub async fn enqueue(
    db: &Database,
    endpoint: &str,
    method: HttpMethod,
    data: Vec<u8>,
    created_at: DateTime<Utc>,
) -> Result<i64, CsuError> {
    let endpoint = endpoint.to_string();
    let method = method.to_string();
    let created_at = timestamp(created_at);
    db.run(move |conn| {
        conn.execute(
            "INSERT INTO sync_queue (endpoint, method, data, created_at, retries) \
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![endpoint, method, data, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
    .await
}

/// Current queue contents in insertion order.
pub async fn list(db: &Database) -> Result<Vec<SyncQueueItem>, CsuError> {
    db.run(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, endpoint, method, data, created_at, retries \
             FROM sync_queue ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], row_to_item)?;
        rows.collect()
    })
    .await
}

pub async fn remove(db: &Database, id: i64) -> Result<(), CsuError> {
    db.run(move |conn| {
        conn.execute("DELETE FROM sync_queue WHERE id = ?1", params![id])?;
        Ok(())
    })
    .await
}

/// Record one failed replay.
///
/// When the incremented count would exceed `policy.max_retries` the item is
/// deleted instead, after being copied to `dead_letters` if enabled. The
/// read, the decision, and the write run in one transaction.
pub async fn increment_retry(
    db: &Database,
    id: i64,
    policy: RetryPolicy,
    now: DateTime<Utc>,
) -> Result<RetryOutcome, CsuError> {
    let evicted_at = timestamp(now);
    db.run(move |conn| {
        let tx = conn.transaction()?;
        let current = tx
            .query_row(
                "SELECT id, endpoint, method, data, created_at, retries \
                 FROM sync_queue WHERE id = ?1",
                params![id],
                row_to_item,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some(item) = current else {
            tx.commit()?;
            return Ok(RetryOutcome::Missing);
        };

        let retries = item.retries.saturating_add(1);
        let outcome = if retries > policy.max_retries {
            if policy.dead_letter {
                tx.execute(
                    "INSERT OR REPLACE INTO dead_letters \
                     (id, endpoint, method, data, created_at, retries, evicted_at) \
                     SELECT id, endpoint, method, data, created_at, ?2, ?3 \
                     FROM sync_queue WHERE id = ?1",
                    params![id, retries, evicted_at],
                )?;
            }
            tx.execute("DELETE FROM sync_queue WHERE id = ?1", params![id])?;
            RetryOutcome::Evicted { retries }
        } else {
            tx.execute(
                "UPDATE sync_queue SET retries = ?2 WHERE id = ?1",
                params![id, retries],
            )?;
            RetryOutcome::Retrying { retries }
        };

        tx.commit()?;
        Ok(outcome)
    })
    .await
}

pub async fn list_dead_letters(db: &Database) -> Result<Vec<DeadLetter>, CsuError> {
    db.run(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, endpoint, method, data, created_at, retries, evicted_at \
             FROM dead_letters ORDER BY evicted_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DeadLetter {
                id: row.get(0)?,
                endpoint: row.get(1)?,
                method: parse_method(row, 2)?,
                data: row.get(3)?,
                created_at: parse_timestamp(row, 4)?,
                retries: row.get(5)?,
                evicted_at: parse_timestamp(row, 6)?,
            })
        })?;
        rows.collect()
    })
    .await
}

pub async fn count_queued(db: &Database) -> Result<u64, CsuError> {
    super::count(db, "SELECT COUNT(*) FROM sync_queue").await
}

pub async fn count_dead_letters(db: &Database) -> Result<u64, CsuError> {
    super::count(db, "SELECT COUNT(*) FROM dead_letters").await
}
