// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the store's record collections.
//!
//! Dates are stored as `YYYY-MM-DD` text so range scans can use plain string
//! comparison; timestamps are RFC 3339 text. A value that fails to decode
//! surfaces as `FromSqlConversionFailure`, which the store treats as corruption.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;

pub mod cache;
pub mod entries;
pub mod sync_queue;

pub(crate) async fn count(
    db: &crate::database::Database,
    sql: &'static str,
) -> Result<u64, csutrack_core::CsuError> {
    let n: i64 = db
        .run(move |conn| conn.query_row(sql, [], |row| row.get(0)))
        .await?;
    Ok(n.max(0) as u64)
}

pub(crate) fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn conversion_failure(
    idx: usize,
    ty: Type,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

pub(crate) fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_failure(idx, Type::Text, e))
}

pub(crate) fn parse_timestamp(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, Type::Text, e))
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_failure(idx, Type::Text, e))
}
