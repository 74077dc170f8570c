// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry collection: one record per calendar day, last write wins.

use chrono::{DateTime, NaiveDate, Utc};
use csutrack_core::{CsuError, Entry};
use rusqlite::params;

use super::{date_key, parse_date, parse_json, parse_timestamp, timestamp};
use crate::database::Database;

const ENTRY_COLUMNS: &str = "date, score, itch_score, hive_score, notes, photo_url, \
                             triggers, qol_data, synced, updated_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        date: parse_date(row, 0)?,
        score: row.get(1)?,
        itch_score: row.get(2)?,
        hive_score: row.get(3)?,
        notes: row.get(4)?,
        photo_url: row.get(5)?,
        triggers: parse_json(row, 6)?,
        qol_data: parse_json(row, 7)?,
        synced: row.get(8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

/// Insert or replace the record for `entry.date`.
pub async fn upsert_entry(db: &Database, entry: &Entry) -> Result<(), CsuError> {
    let triggers = serde_json::to_string(&entry.triggers)
        .map_err(|e| CsuError::Internal(format!("failed to encode triggers: {e}")))?;
    let qol_data = serde_json::to_string(&entry.qol_data)
        .map_err(|e| CsuError::Internal(format!("failed to encode qol_data: {e}")))?;
    let date = date_key(entry.date);
    let score = entry.score;
    let itch = entry.itch_score;
    let hive = entry.hive_score;
    let notes = entry.notes.clone();
    let photo_url = entry.photo_url.clone();
    let synced = entry.synced;
    let updated_at = timestamp(entry.updated_at);

    db.run(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO entries (date, score, itch_score, hive_score, notes, \
             photo_url, triggers, qol_data, synced, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                date, score, itch, hive, notes, photo_url, triggers, qol_data, synced, updated_at
            ],
        )?;
        Ok(())
    })
    .await
}

pub async fn get_entry(db: &Database, date: NaiveDate) -> Result<Option<Entry>, CsuError> {
    let date = date_key(date);
    db.run(move |conn| {
        let mut stmt =
            conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE date = ?1"))?;
        let mut rows = stmt.query_map(params![date], row_to_entry)?;
        rows.next().transpose()
    })
    .await
}

/// Inclusive range scan, ascending by date. An inverted range yields nothing.
pub async fn get_entries_in_range(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Entry>, CsuError> {
    let start = date_key(start);
    let end = date_key(end);
    db.run(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE date BETWEEN ?1 AND ?2 ORDER BY date ASC"
        ))?;
        let rows = stmt.query_map(params![start, end], row_to_entry)?;
        rows.collect()
    })
    .await
}

/// Every entry, decoded. Used by the unsynced filter, which must scan the
/// whole collection rather than index on `synced`.
pub async fn scan_entries(db: &Database) -> Result<Vec<Entry>, CsuError> {
    db.run(|conn| {
        let mut stmt =
            conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY date ASC"))?;
        let rows = stmt.query_map([], row_to_entry)?;
        rows.collect()
    })
    .await
}

/// Sets `synced = 1` only while the stored row is still the version stamped
/// `updated_at`. Returns false when the entry is gone or was saved again.
pub async fn mark_synced(
    db: &Database,
    date: NaiveDate,
    updated_at: DateTime<Utc>,
) -> Result<bool, CsuError> {
    let date = date_key(date);
    let updated_at = timestamp(updated_at);
    db.run(move |conn| {
        let changed = conn.execute(
            "UPDATE entries SET synced = 1 WHERE date = ?1 AND updated_at = ?2",
            params![date, updated_at],
        )?;
        Ok(changed > 0)
    })
    .await
}

pub async fn count_entries(db: &Database) -> Result<u64, CsuError> {
    super::count(db, "SELECT COUNT(*) FROM entries").await
}

/// Entries stamped `synced = 0`. Status display only; the engine uses the scan.
pub async fn count_unsynced(db: &Database) -> Result<u64, CsuError> {
    super::count(db, "SELECT COUNT(*) FROM entries WHERE synced = 0").await
}
