// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the CSU tracker offline layer.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the four record collections of
//! the local store: entries, the sync queue, cached user data, and cached
//! pages. Evicted queue items are kept in a dead-letter collection.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
pub use queries::sync_queue::RetryPolicy;
