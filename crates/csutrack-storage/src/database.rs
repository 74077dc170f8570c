// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::{Path, PathBuf};

use csutrack_core::CsuError;
use rusqlite::ErrorCode;
use tracing::debug;

/// Handle to the open store file.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Opens the database at `path`, creating parent directories and the file
    /// on first run, applying PRAGMAs, then running pending migrations.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, CsuError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CsuError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| CsuError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn, path };

        db.run(move |conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
            if wal_mode {
                let _: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
            }
            Ok(())
        })
        .await?;

        db.conn
            .call(|conn| Ok::<_, rusqlite::Error>(crate::migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)??;

        debug!(path = %db.path.display(), wal_mode, "database opened");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` on the connection thread, classifying rusqlite failures into
    /// [`CsuError::Storage`] or [`CsuError::Corruption`].
    pub async fn run<R, F>(&self, f: F) -> Result<R, CsuError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok::<_, rusqlite::Error>(f(conn).map_err(classify)))
            .await
            .map_err(map_tr_err)?
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), CsuError> {
        self.run(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!(path = %self.path.display(), "database closed");
        Ok(())
    }
}

/// Sorts a rusqlite failure into the corruption class or an ordinary storage error.
///
/// Type mismatches and undecodable values found while reading rows count as
/// corruption, as do SQLite's own corrupt-file codes.
pub fn classify(e: rusqlite::Error) -> CsuError {
    let corrupt = match &e {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => true,
        rusqlite::Error::SqliteFailure(err, _) => matches!(
            err.code,
            ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase
        ),
        _ => false,
    };

    if corrupt {
        CsuError::Corruption {
            source: Box::new(e),
        }
    } else {
        CsuError::Storage {
            source: Box::new(e),
        }
    }
}

/// Convert a tokio-rusqlite error into CsuError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CsuError {
    CsuError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("offline.db");
        let db = Database::open(&path, true).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_enables_wal_mode() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("wal.db"), true).await.unwrap();
        let mode: String = db
            .run(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn migrations_provision_all_collections() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("schema.db"), false).await.unwrap();
        let tables: Vec<String> = db
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' AND name NOT LIKE 'refinery_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(
            tables,
            vec!["dead_letters", "entries", "page_cache", "sync_queue", "user_data"]
        );
    }

    #[tokio::test]
    async fn reopen_keeps_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let db = Database::open(&path, true).await.unwrap();
        db.run(|conn| {
            conn.execute(
                "INSERT INTO user_data (key, data, cached_at) VALUES ('k', '1', 'now')",
                [],
            )
        })
        .await
        .unwrap();
        db.close().await.unwrap();

        let db = Database::open(&path, true).await.unwrap();
        let count: i64 = db
            .run(|conn| conn.query_row("SELECT COUNT(*) FROM user_data", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn type_mismatch_is_corruption() {
        let err = classify(rusqlite::Error::InvalidColumnType(
            8,
            "synced".into(),
            rusqlite::types::Type::Text,
        ));
        assert!(err.is_corruption());
    }

    #[test]
    fn busy_is_ordinary_storage_error() {
        let err = classify(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(matches!(err, CsuError::Storage { .. }));
    }

    #[test]
    fn not_a_database_is_corruption() {
        let err = classify(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            None,
        ));
        assert!(err.is_corruption());
    }
}
