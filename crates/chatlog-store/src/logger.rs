//! Write path: one row per conversation turn.

use std::fmt;
use std::sync::Arc;

use chatlog_settings::LoggingSettings;
use serde_json::Value;
use tracing::{error, instrument};

use crate::errors::Result;
use crate::provider::ConnectionProvider;
use crate::sqlite::repositories::ChatLogRepo;
use crate::sqlite::row_types::NewChatLogRow;
use crate::types::{ChatLogRecord, Metadata, error_text};

/// Records conversation turns.
///
/// Each call performs exactly one insert, with no retry. A failed insert is
/// always reported as a `tracing` error event carrying the would-be record;
/// whether the caller also sees the error depends on `mute_errors`.
#[derive(Clone)]
pub struct EventLogger {
    provider: Arc<dyn ConnectionProvider>,
    mute_errors: bool,
}

impl EventLogger {
    /// Logger with error muting on.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            mute_errors: true,
        }
    }

    /// Logger configured from the `logging` settings section.
    pub fn from_settings(provider: Arc<dyn ConnectionProvider>, settings: &LoggingSettings) -> Self {
        Self::new(provider).with_mute_errors(settings.mute_errors)
    }

    /// Turn error muting on or off.
    #[must_use]
    pub fn with_mute_errors(mut self, mute_errors: bool) -> Self {
        self.mute_errors = mute_errors;
        self
    }

    /// Whether write failures are swallowed after being reported.
    pub fn mute_errors(&self) -> bool {
        self.mute_errors
    }

    /// Record a successful turn.
    #[instrument(skip_all, fields(sender_id = %sender_id))]
    pub async fn log_interaction(
        &self,
        sender_id: &str,
        responses: &[Value],
        request: &Value,
        metadata: &Metadata,
    ) -> Result<()> {
        let record = ChatLogRecord::new(sender_id, responses, request, metadata);
        self.store(record).await
    }

    /// Record a turn that failed with `err`.
    ///
    /// The stored `err` column is the error's text, trimmed and cut to
    /// [`ERR_MAX_CHARS`](crate::types::ERR_MAX_CHARS) characters.
    #[instrument(skip_all, fields(sender_id = %sender_id))]
    pub async fn log_error<E>(
        &self,
        err: &E,
        sender_id: &str,
        responses: &[Value],
        request: &Value,
        metadata: &Metadata,
    ) -> Result<()>
    where
        E: fmt::Display + fmt::Debug + ?Sized,
    {
        let record =
            ChatLogRecord::new(sender_id, responses, request, metadata).with_err(error_text(err));
        self.store(record).await
    }

    async fn store(&self, record: ChatLogRecord) -> Result<()> {
        match self.insert(&record).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let snapshot = serde_json::to_string(&record)
                    .unwrap_or_else(|ser| format!("<unserializable record: {ser}>"));
                error!(error = %e, record = %snapshot, "failed to store chat log");
                if self.mute_errors { Ok(()) } else { Err(e) }
            }
        }
    }

    async fn insert(&self, record: &ChatLogRecord) -> Result<()> {
        let row = NewChatLogRow::from_record(record)?;
        let conn = self.provider.connection().await?;
        tokio::task::spawn_blocking(move || ChatLogRepo::insert(&conn, &row)).await?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
