//! Error types for the chat log store.
//!
//! [`StoreError`] is returned by every store operation. Reads always surface
//! it; the write path only surfaces it when error muting is disabled.

use thiserror::Error;

/// Errors that can occur during chat log operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A payload could not be converted to storable JSON text.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The insert was rejected by storage.
    #[error("write failed: {0}")]
    Write(#[source] rusqlite::Error),

    /// A history query was rejected by storage.
    #[error("read failed: {0}")]
    Read(#[source] rusqlite::Error),

    /// Any other `SQLite` failure (pragmas, schema inspection).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be prepared.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A stored column could not be decoded.
    #[error("corrupt row in chatlogs.{column}: {detail}")]
    CorruptRow {
        /// Column that failed to decode.
        column: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// The blocking database task panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Task(e.to_string())
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_display() {
        let err = StoreError::Write(rusqlite::Error::InvalidQuery);
        assert!(err.to_string().starts_with("write failed"));
    }

    #[test]
    fn read_error_display() {
        let err = StoreError::Read(rusqlite::Error::InvalidQuery);
        assert!(err.to_string().starts_with("read failed"));
    }

    #[test]
    fn serialization_from_serde() {
        let serde_err = serde_json::from_str::<String>("bad").unwrap_err();
        let err: StoreError = serde_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn sqlite_from_rusqlite() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn migration_error_display() {
        let err = StoreError::Migration {
            message: "v001 failed: disk I/O error".into(),
        };
        assert_eq!(err.to_string(), "migration error: v001 failed: disk I/O error");
    }

    #[test]
    fn corrupt_row_display() {
        let err = StoreError::CorruptRow {
            column: "request",
            detail: "invalid JSON".into(),
        };
        assert_eq!(err.to_string(), "corrupt row in chatlogs.request: invalid JSON");
    }
}
