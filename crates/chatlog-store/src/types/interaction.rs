//! The read-side view of a stored turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{self, StructuredValue};
use crate::errors::{Result, StoreError};
use crate::sqlite::row_types::ChatLogRow;
use crate::types::record::Metadata;

/// Keys owned by the stored columns. Metadata entries with these names are
/// shadowed by the column values.
const COLUMN_KEYS: [&str; 6] = ["senderId", "pageId", "timestamp", "request", "responses", "err"];

/// One stored turn as returned by a history read.
///
/// Serializes to a flat object: the metadata fields merged with the column
/// fields. `err` is omitted when the turn succeeded.
///
/// On conflicting keys the stored column wins over the metadata member of the
/// same name. The columns hold the normalized values the row was filed and
/// ordered under, so metadata `{"timestamp": "42"}` reads back as the integer
/// `42` and `{"pageId": ""}` reads back as `null`. The raw metadata member is
/// not returned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Sender the turn belongs to.
    pub sender_id: String,
    /// Page identity, `null` when absent.
    pub page_id: Option<String>,
    /// Ordering key, `null` when absent.
    pub timestamp: Option<i64>,
    /// Inbound event payload.
    pub request: Value,
    /// Payloads sent back, in order.
    pub responses: Vec<Value>,
    /// Failure description, present only for error turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    /// Remaining metadata fields.
    #[serde(flatten)]
    pub extra: Metadata,
}

impl Interaction {
    /// Decode a raw row. Payload columns that are not valid JSON of the
    /// expected shape yield [`StoreError::CorruptRow`].
    pub fn from_row(row: ChatLogRow) -> Result<Self> {
        let request = parse_column("request", &row.request)?;
        let responses = match parse_column("responses", &row.responses)? {
            Value::Array(items) => items,
            other => return Err(corrupt("responses", format!("expected array, got {other}"))),
        };
        let mut extra = match parse_column("metadata", &row.metadata)? {
            Value::Object(map) => map,
            Value::Null => Metadata::new(),
            other => return Err(corrupt("metadata", format!("expected object, got {other}"))),
        };
        extra.retain(|key, _| !COLUMN_KEYS.contains(&key.as_str()));

        Ok(Self {
            sender_id: row.sender_id,
            page_id: row.page_id,
            timestamp: row.timestamp,
            request,
            responses,
            err: row.err,
            extra,
        })
    }

    /// The metadata `flag`, if it was a string.
    pub fn flag(&self) -> Option<&str> {
        self.extra.get("flag").and_then(Value::as_str)
    }

    /// The request with ISO-8601 strings revived as date-times.
    pub fn decoded_request(&self) -> StructuredValue {
        codec::decode(&self.request)
    }

    /// Each response with ISO-8601 strings revived as date-times.
    pub fn decoded_responses(&self) -> Vec<StructuredValue> {
        self.responses.iter().map(codec::decode).collect()
    }
}

fn parse_column(column: &'static str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| corrupt(column, e.to_string()))
}

fn corrupt(column: &'static str, detail: String) -> StoreError {
    StoreError::CorruptRow { column, detail }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn row(metadata: &str) -> ChatLogRow {
        ChatLogRow {
            sender_id: "u1".into(),
            request: r#"{"text":"hi","at":"2020-09-13T12:26:40Z"}"#.into(),
            responses: r#"[{"text":"hello"}]"#.into(),
            metadata: metadata.into(),
            page_id: Some("p1".into()),
            timestamp: Some(20),
            err: None,
        }
    }

    #[test]
    fn merges_metadata_under_columns() {
        let i = Interaction::from_row(row(
            r#"{"pageId":"other","timestamp":99,"lang":"cs","flag":"f"}"#,
        ))
        .unwrap();
        let v = serde_json::to_value(&i).unwrap();

        assert_eq!(v["senderId"], "u1");
        assert_eq!(v["pageId"], "p1");
        assert_eq!(v["timestamp"], 20);
        assert_eq!(v["lang"], "cs");
        assert_eq!(v["flag"], "f");
        assert_eq!(v["responses"], json!([{"text": "hello"}]));
        assert!(v.get("err").is_none());
        assert_eq!(i.flag(), Some("f"));
    }

    #[test]
    fn columns_shadow_coerced_metadata() {
        let mut r = row(r#"{"timestamp":"42","pageId":"","err":"stale"}"#);
        r.page_id = None;
        r.timestamp = Some(42);
        let v = serde_json::to_value(Interaction::from_row(r).unwrap()).unwrap();

        assert_eq!(v["timestamp"], 42);
        assert_eq!(v["pageId"], Value::Null);
        assert!(v.get("err").is_none());
    }

    #[test]
    fn err_is_emitted_when_present() {
        let mut r = row("{}");
        r.err = Some("boom".into());
        let v = serde_json::to_value(Interaction::from_row(r).unwrap()).unwrap();
        assert_eq!(v["err"], "boom");
    }

    #[test]
    fn absent_columns_serialize_as_null() {
        let mut r = row("{}");
        r.page_id = None;
        r.timestamp = None;
        let v = serde_json::to_value(Interaction::from_row(r).unwrap()).unwrap();
        assert_eq!(v["pageId"], Value::Null);
        assert_eq!(v["timestamp"], Value::Null);
    }

    #[test]
    fn corrupt_payload_is_reported_with_column() {
        let mut r = row("{}");
        r.responses = "not json".into();
        assert_matches!(
            Interaction::from_row(r),
            Err(StoreError::CorruptRow { column: "responses", .. })
        );
        assert_matches!(
            Interaction::from_row(row("[1]")),
            Err(StoreError::CorruptRow { column: "metadata", .. })
        );
    }

    #[test]
    fn decoded_request_revives_dates() {
        let i = Interaction::from_row(row("{}")).unwrap();
        let StructuredValue::Object(map) = i.decoded_request() else {
            panic!("expected object");
        };
        assert_matches!(map["at"], StructuredValue::DateTime(_));
        assert_eq!(map["text"], StructuredValue::String("hi".into()));
    }
}
