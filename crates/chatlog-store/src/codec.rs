//! Date-aware conversion between JSON and in-memory payload trees.
//!
//! Payloads travel through storage as plain JSON, which has no date type.
//! [`encode`] lowers a [`StructuredValue`] tree to JSON, replacing every
//! date-time with its ISO-8601 UTC text. [`decode`] goes the other way and
//! revives any string that matches the strict ISO-8601 shape
//! `YYYY-MM-DDTHH:MM:SS[.fraction][Z|±HH:MM]` (case-insensitive).
//!
//! Both functions are pure: they borrow their input and build a new tree, so
//! a payload shared between concurrent callers is never mutated.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(([+-][0-9]{2}:[0-9]{2})|Z)?$")
        .expect("ISO date pattern is valid")
});

/// A JSON-like value that can also hold a date-time.
#[derive(Clone, Debug, PartialEq)]
pub enum StructuredValue {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(serde_json::Number),
    /// A string that is not a date-time.
    String(String),
    /// A point in time.
    DateTime(DateTime<Utc>),
    /// Ordered sequence.
    Array(Vec<StructuredValue>),
    /// String-keyed map.
    Object(BTreeMap<String, StructuredValue>),
}

/// Lower a tree to JSON, rendering date-times as ISO-8601 UTC strings.
///
/// Sub-second precision is kept (milli, micro or nano digits as needed), so
/// [`decode`] restores the same instant.
pub fn encode(value: &StructuredValue) -> Value {
    match value {
        StructuredValue::Null => Value::Null,
        StructuredValue::Bool(b) => Value::Bool(*b),
        StructuredValue::Number(n) => Value::Number(n.clone()),
        StructuredValue::String(s) => Value::String(s.clone()),
        StructuredValue::DateTime(dt) => {
            Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        StructuredValue::Array(items) => Value::Array(items.iter().map(encode).collect()),
        StructuredValue::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
    }
}

/// Lift JSON into a tree, reviving ISO-8601 strings as date-times.
///
/// Strings that only look partially like dates, or that match the shape but
/// name an impossible instant (month 13, hour 25), stay strings.
pub fn decode(value: &Value) -> StructuredValue {
    match value {
        Value::Null => StructuredValue::Null,
        Value::Bool(b) => StructuredValue::Bool(*b),
        Value::Number(n) => StructuredValue::Number(n.clone()),
        Value::String(s) => parse_iso_date(s)
            .map_or_else(|| StructuredValue::String(s.clone()), StructuredValue::DateTime),
        Value::Array(items) => StructuredValue::Array(items.iter().map(decode).collect()),
        Value::Object(map) => StructuredValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), decode(v)))
                .collect(),
        ),
    }
}

/// Parse a string in the strict ISO-8601 shape into a UTC instant.
///
/// A missing offset is read as UTC.
pub fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    if !ISO_DATE.is_match(s) {
        return None;
    }
    let normalized = s.to_ascii_uppercase();
    let has_offset = normalized.ends_with('Z') || normalized[19..].contains(['+', '-']);

    if has_offset {
        DateTime::parse_from_rfc3339(&normalized)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    } else {
        NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
