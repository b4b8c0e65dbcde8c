//! Versioned schema for the chat log database.
//!
//! Each migration is an embedded SQL script applied in its own transaction
//! and recorded in `schema_version`. Applied versions are skipped, so running
//! [`run_migrations`] on every startup is safe.

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::errors::{Result, StoreError};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

impl Migration {
    fn apply(&self, conn: &Connection) -> Result<()> {
        let fail = |stage: &str, e: rusqlite::Error| StoreError::Migration {
            message: format!("v{:03} ({}) {stage}: {e}", self.version, self.description),
        };

        let tx = conn.unchecked_transaction().map_err(|e| fail("begin", e))?;
        tx.execute_batch(self.sql).map_err(|e| fail("script", e))?;
        let _ = tx
            .execute(
                "INSERT INTO schema_version (version, applied_at, description)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?2)",
                params![self.version, self.description],
            )
            .map_err(|e| fail("record", e))?;
        tx.commit().map_err(|e| fail("commit", e))
    }
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "chatlogs table with page/sender/timestamp and flag indexes",
    sql: include_str!("v001_chatlogs.sql"),
}];

/// Apply every pending migration. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
           version     INTEGER PRIMARY KEY,
           applied_at  TEXT NOT NULL,
           description TEXT
         );",
    )
    .map_err(|e| StoreError::Migration {
        message: format!("schema_version unavailable: {e}"),
    })?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        debug!(version = current, "schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        info!(version = migration.version, description = migration.description, "applying migration");
        migration.apply(conn)?;
    }
    let applied = u32::try_from(pending.len()).unwrap_or(u32::MAX);
    info!(applied, version = latest_version(), "schema migrated");
    Ok(applied)
}

/// Highest applied version, `0` for a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .map_err(|e| StoreError::Migration {
        message: format!("cannot read schema_version: {e}"),
    })
}

/// Version the schema reaches once all embedded migrations are applied.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_table_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 1);

        let tables = names(&conn, "table");
        assert!(tables.contains(&"chatlogs".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));

        let indexes = names(&conn, "index");
        assert!(indexes.contains(&"page_sender_timestamp".to_string()));
        assert!(indexes.contains(&"flag".to_string()));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 1);
        assert_eq!(run_migrations(&conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn version_unreadable_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_matches!(current_version(&conn), Err(StoreError::Migration { .. }));
    }

    #[test]
    fn timestamp_column_is_integer() {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        let decl: String = conn
            .query_row(
                "SELECT type FROM pragma_table_info('chatlogs') WHERE name = 'timestamp'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(decl, "INTEGER");
    }

    #[test]
    fn failed_script_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        let broken = Migration {
            version: 2,
            description: "broken",
            sql: "CREATE TABLE extra (id INTEGER); NOT SQL;",
        };
        assert_matches!(broken.apply(&conn), Err(StoreError::Migration { .. }));
        assert!(!names(&conn, "table").contains(&"extra".to_string()));
        assert_eq!(current_version(&conn).unwrap(), 1);
    }
}
