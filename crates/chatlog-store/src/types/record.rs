//! The write-side record: one conversation turn about to be persisted.
//!
//! Building a [`ChatLogRecord`] pulls the relational columns (`pageId`,
//! `flag`, `timestamp`) out of the free-form metadata map, derives the wall
//! clock `time` from the request, and keeps the payloads as JSON for storage.

use std::fmt::{self, Write as _};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use chatlog_core::text::trim_truncate;

use crate::codec;

/// Free-form metadata attached to a turn.
pub type Metadata = serde_json::Map<String, Value>;

/// Maximum stored length of an error description, in characters.
pub const ERR_MAX_CHARS: usize = 73;

/// Stored when an error cannot be rendered at all.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// One conversation turn ready to be inserted into `chatlogs`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogRecord {
    /// Sender the turn belongs to.
    pub sender_id: String,
    /// Wall-clock time of the turn.
    pub time: DateTime<Utc>,
    /// Inbound event payload.
    pub request: Value,
    /// Payloads sent back, in order.
    pub responses: Vec<Value>,
    /// Page identity, taken from `metadata.pageId`.
    pub page_id: Option<String>,
    /// Correlation tag, taken from `metadata.flag` when it is a string.
    pub flag: Option<String>,
    /// Ordering key, taken from `metadata.timestamp` when it is a whole
    /// number or a string holding one.
    pub timestamp: Option<i64>,
    /// The full metadata map, stored as JSON.
    pub metadata: Metadata,
    /// Failure description for error turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl ChatLogRecord {
    /// Build a record for a turn that happened now (or at the request's own
    /// `timestamp`, if it carries one).
    pub fn new(sender_id: &str, responses: &[Value], request: &Value, metadata: &Metadata) -> Self {
        Self::at(sender_id, responses, request, metadata, Utc::now())
    }

    /// Like [`ChatLogRecord::new`] with an explicit fallback clock.
    pub fn at(
        sender_id: &str,
        responses: &[Value],
        request: &Value,
        metadata: &Metadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            time: request_time(request).unwrap_or(now),
            request: request.clone(),
            responses: responses.to_vec(),
            page_id: metadata.get("pageId").and_then(page_id_of),
            flag: metadata
                .get("flag")
                .and_then(Value::as_str)
                .map(str::to_string),
            timestamp: metadata.get("timestamp").and_then(timestamp_of),
            metadata: metadata.clone(),
            err: None,
        }
    }

    /// Attach a failure description.
    #[must_use]
    pub fn with_err(mut self, err: Option<String>) -> Self {
        self.err = err;
        self
    }
}

/// Render an error for the `err` column.
///
/// The `Display` form is trimmed and cut to [`ERR_MAX_CHARS`]. If `Display`
/// itself fails, the `Debug` form is tried, then [`UNKNOWN_ERROR`]. An error
/// that renders to nothing but whitespace yields `None`.
pub fn error_text<E>(err: &E) -> Option<String>
where
    E: fmt::Display + fmt::Debug + ?Sized,
{
    let mut rendered = String::new();
    if write!(rendered, "{err}").is_err() {
        rendered.clear();
        if write!(rendered, "{err:?}").is_err() {
            rendered = UNKNOWN_ERROR.to_string();
        }
    }
    let text = trim_truncate(&rendered, ERR_MAX_CHARS);
    (!text.is_empty()).then(|| text.to_string())
}

/// `request.timestamp` as epoch milliseconds, a numeric string, or an ISO date.
fn request_time(request: &Value) -> Option<DateTime<Utc>> {
    match request.get("timestamp")? {
        Value::Number(n) => millis_to_time(number_to_i64(n)?),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .and_then(millis_to_time)
            .or_else(|| codec::parse_iso_date(s)),
        _ => None,
    }
}

fn millis_to_time(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn number_to_i64(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.abs() < 9.2e18)
            .map(|f| f.trunc() as i64)
    })
}

fn page_id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Only whole numbers are usable ordering keys. A fractional value would be
/// cut by the `INTEGER` column, so it is stored as NULL instead.
fn timestamp_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.fract() == 0.0)
            .then(|| number_to_i64(n))
            .flatten(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
