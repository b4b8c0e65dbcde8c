//! Pooled `SQLite` handles for the chat log.
//!
//! Every handle the pool creates is tuned by [`Tuning`] before first use:
//! WAL journaling so history reads do not block the logger, a busy timeout
//! for concurrent writers, and a per-connection page cache.

use std::time::Duration;

use chatlog_settings::DatabaseSettings;
use r2d2::{CustomizeConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;

/// Pool of chat log connections.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a [`ConnectionPool`].
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Pool sizing and per-connection tuning.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Upper bound on open connections.
    pub pool_size: u32,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache per connection, in KiB.
    pub cache_size_kib: i64,
    /// How long a checkout waits for a free connection.
    pub connection_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&DatabaseSettings::default())
    }
}

impl From<&DatabaseSettings> for ConnectionConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            pool_size: settings.pool_size,
            busy_timeout_ms: settings.busy_timeout_ms,
            cache_size_kib: settings.cache_size_kib,
            connection_timeout: Duration::from_secs(settings.connection_timeout_secs),
        }
    }
}

#[derive(Debug)]
struct Tuning {
    busy_timeout_ms: u32,
    cache_size_kib: i64,
}

impl CustomizeConnection<Connection, rusqlite::Error> for Tuning {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        // Negative cache_size is interpreted by SQLite as KiB.
        let script = format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {busy};
             PRAGMA cache_size = -{cache};",
            busy = self.busy_timeout_ms,
            cache = self.cache_size_kib,
        );
        conn.execute_batch(&script)
    }
}

fn pool_of(manager: SqliteConnectionManager, max_size: u32, config: &ConnectionConfig) -> Result<ConnectionPool> {
    Ok(Pool::builder()
        .max_size(max_size)
        .connection_timeout(config.connection_timeout)
        .connection_customizer(Box::new(Tuning {
            busy_timeout_ms: config.busy_timeout_ms,
            cache_size_kib: config.cache_size_kib,
        }))
        .build(manager)?)
}

/// In-memory pool. Each in-memory connection is a separate database, so the
/// pool is capped at one connection whatever `config.pool_size` says.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    pool_of(SqliteConnectionManager::memory(), 1, config)
}

/// Pool over the database file at `path`.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    pool_of(SqliteConnectionManager::file(path), config.pool_size, config)
}

/// [`new_in_memory`] for [`IN_MEMORY_PATH`], [`new_file`] for anything else.
pub fn open(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    if path == IN_MEMORY_PATH {
        new_in_memory(config)
    } else {
        new_file(path, config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
