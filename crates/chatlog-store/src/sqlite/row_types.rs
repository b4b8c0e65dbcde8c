//! Database row types for the `chatlogs` table.
//!
//! These are the raw column shapes with payloads still as JSON text.
//! Conversion to [`ChatLogRecord`] / [`Interaction`] happens at the edges.
//!
//! [`ChatLogRecord`]: crate::types::ChatLogRecord
//! [`Interaction`]: crate::types::Interaction

use chrono::SecondsFormat;

use crate::errors::Result;
use crate::types::ChatLogRecord;

/// A row ready for `INSERT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChatLogRow {
    /// Sender ID.
    pub sender_id: String,
    /// ISO-8601 wall-clock time.
    pub time: String,
    /// Request JSON.
    pub request: String,
    /// Responses JSON array.
    pub responses: String,
    /// Page ID.
    pub page_id: Option<String>,
    /// Metadata JSON object.
    pub metadata: String,
    /// Correlation flag.
    pub flag: Option<String>,
    /// Ordering key.
    pub timestamp: Option<i64>,
    /// Error text.
    pub err: Option<String>,
}

impl NewChatLogRow {
    /// Serialize a record's payloads.
    pub fn from_record(record: &ChatLogRecord) -> Result<Self> {
        Ok(Self {
            sender_id: record.sender_id.clone(),
            time: record.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            request: serde_json::to_string(&record.request)?,
            responses: serde_json::to_string(&record.responses)?,
            page_id: record.page_id.clone(),
            metadata: serde_json::to_string(&record.metadata)?,
            flag: record.flag.clone(),
            timestamp: record.timestamp,
            err: record.err.clone(),
        })
    }
}

/// Raw row returned by a history read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLogRow {
    /// Sender ID.
    pub sender_id: String,
    /// Request JSON.
    pub request: String,
    /// Responses JSON array.
    pub responses: String,
    /// Metadata JSON object.
    pub metadata: String,
    /// Page ID.
    pub page_id: Option<String>,
    /// Ordering key.
    pub timestamp: Option<i64>,
    /// Error text.
    pub err: Option<String>,
}
