//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! settings file is valid: missing fields keep their compiled default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type for the chat log store.
///
/// Example `~/.chatlog/settings.json`:
///
/// ```json
/// {
///   "database": { "path": "/var/lib/bot/chatlog.db", "poolSize": 8 },
///   "logging": { "muteErrors": false }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatlogSettings {
    /// Database location and connection pool tuning.
    pub database: DatabaseSettings,
    /// Diagnostic output and write-failure policy.
    pub logging: LoggingSettings,
}

/// Database location and connection pool tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path of the `SQLite` file. `":memory:"` opens a private in-memory database.
    pub path: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size per connection, in KiB.
    pub cache_size_kib: i64,
    /// Seconds to wait for a free pooled connection.
    pub connection_timeout_secs: u64,
    /// Skip schema migrations at startup (schema managed elsewhere).
    pub skip_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            connection_timeout_secs: 5,
            skip_migrations: false,
        }
    }
}

/// Diagnostic output and write-failure policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// When true, failed chat log writes are reported but never returned to
    /// the caller.
    pub mute_errors: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            mute_errors: true,
        }
    }
}

/// `~/.chatlog`, or `/tmp/.chatlog` when `HOME` is unset.
pub(crate) fn chatlog_home() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_else(|| "/tmp".into());
    PathBuf::from(home).join(".chatlog")
}

fn default_database_path() -> String {
    chatlog_home().join("chatlog.db").to_string_lossy().into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
