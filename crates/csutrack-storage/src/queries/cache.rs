// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-write-wins key/value caches for user data and page snapshots.

use chrono::{DateTime, Utc};
use csutrack_core::{CachedPage, CachedUserData, CsuError};
use rusqlite::params;

use super::{parse_json, parse_timestamp, timestamp};
use crate::database::Database;

pub async fn put_user_data(
    db: &Database,
    key: &str,
    data: &serde_json::Value,
    cached_at: DateTime<Utc>,
) -> Result<(), CsuError> {
    let key = key.to_string();
    let data = data.to_string();
    let cached_at = timestamp(cached_at);
    db.run(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO user_data (key, data, cached_at) VALUES (?1, ?2, ?3)",
            params![key, data, cached_at],
        )?;
        Ok(())
    })
    .await
}

pub async fn get_user_data(db: &Database, key: &str) -> Result<Option<CachedUserData>, CsuError> {
    let key = key.to_string();
    db.run(move |conn| {
        let mut stmt =
            conn.prepare("SELECT key, data, cached_at FROM user_data WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| {
            Ok(CachedUserData {
                key: row.get(0)?,
                data: parse_json(row, 1)?,
                cached_at: parse_timestamp(row, 2)?,
            })
        })?;
        rows.next().transpose()
    })
    .await
}

pub async fn put_page(
    db: &Database,
    url: &str,
    html: &str,
    cached_at: DateTime<Utc>,
) -> Result<(), CsuError> {
    let url = url.to_string();
    let html = html.to_string();
    let cached_at = timestamp(cached_at);
    db.run(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO page_cache (url, html, cached_at) VALUES (?1, ?2, ?3)",
            params![url, html, cached_at],
        )?;
        Ok(())
    })
    .await
}

pub async fn get_page(db: &Database, url: &str) -> Result<Option<CachedPage>, CsuError> {
    let url = url.to_string();
    db.run(move |conn| {
        let mut stmt = conn.prepare("SELECT url, html, cached_at FROM page_cache WHERE url = ?1")?;
        let mut rows = stmt.query_map(params![url], |row| {
            Ok(CachedPage {
                url: row.get(0)?,
                html: row.get(1)?,
                cached_at: parse_timestamp(row, 2)?,
            })
        })?;
        rows.next().transpose()
    })
    .await
}
