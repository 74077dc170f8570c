// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Each version only adds collections and indexes, so an
//! older store is upgraded in place on open without losing compatible rows.

use csutrack_core::CsuError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), CsuError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| CsuError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = %migration.name(), "applied migration");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM refinery_schema_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn upgrade_from_v1_keeps_entries() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        embedded::migrations::runner()
            .set_target(refinery::Target::Version(1))
            .run(&mut conn)
            .unwrap();
        conn.execute(
            "INSERT INTO entries (date, score, updated_at) VALUES ('2026-02-01', 4, '2026-02-01T08:00:00Z')",
            [],
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        let kept: i64 = conn
            .query_row("SELECT score FROM entries WHERE date = '2026-02-01'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(kept, 4);
        let dead: i64 = conn
            .query_row("SELECT COUNT(*) FROM dead_letters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(dead, 0);
    }
}
