//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading `settings.json`.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying JSON failure.
        source: serde_json::Error,
    },
    /// The merged document does not fit the settings shape
    /// (for example `"poolSize": "many"`).
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
