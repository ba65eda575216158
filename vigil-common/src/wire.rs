use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{Category, EventRecord, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparseable timestamp `{0}`")]
    Timestamp(String),
}

/// A stored firewall event as served by the events query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub time: String,
    pub event: Value,
}

#[derive(Debug, Deserialize)]
struct LiveMessage {
    kind: LiveKind,
}

#[derive(Debug, Deserialize)]
struct LiveKind {
    event: RawEvent,
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DecodeError> {
    let raw = raw.trim();
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Ok(timestamp);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.naive_utc())
        .map_err(|_| DecodeError::Timestamp(raw.to_string()))
}

impl TryFrom<RawEvent> for EventRecord {
    type Error = DecodeError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        if raw.event.is_null() {
            return Err(DecodeError::MissingField("event"));
        }
        let timestamp = parse_timestamp(&raw.time)?;
        Ok(EventRecord::new(timestamp, Category::classify(&raw.event)))
    }
}

/// Decodes one bulk record: `{ "time": .., "event": .. }`.
pub fn decode_record(value: Value) -> Result<EventRecord, DecodeError> {
    let raw: RawEvent = serde_json::from_value(value)?;
    EventRecord::try_from(raw)
}

/// Decodes a whole bulk batch. Records that fail are skipped; the second
/// element of the result is how many were skipped.
pub fn decode_records(values: Vec<Value>) -> (Vec<EventRecord>, usize) {
    let total = values.len();
    let records: Vec<EventRecord> = values
        .into_iter()
        .filter_map(|value| decode_record(value).ok())
        .collect();
    let dropped = total - records.len();
    (records, dropped)
}

/// Decodes one text frame of the live events socket:
/// `{ "kind": { "event": { "time": .., "event": .. } } }`.
pub fn decode_live_message(text: &str) -> Result<EventRecord, DecodeError> {
    let message: LiveMessage = serde_json::from_str(text)?;
    EventRecord::try_from(message.kind.event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    #[test]
    fn parses_microsecond_timestamps() {
        let t = parse_timestamp("2024-05-01T10:01:02.123456").unwrap();
        assert_eq!(
            t.date(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(t.nanosecond(), 123_456_000);
    }

    #[test]
    fn parses_nanosecond_timestamps_and_missing_fraction() {
        let t = parse_timestamp("2024-05-01T10:01:02.123456789").unwrap();
        assert_eq!(t.nanosecond(), 123_456_789);

        let t = parse_timestamp("2024-05-01T10:01:02").unwrap();
        assert_eq!(t.second(), 2);
        assert_eq!(t.nanosecond(), 0);
    }

    #[test]
    fn parses_rfc3339_as_utc() {
        let t = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(t.hour(), 10);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DecodeError::Timestamp(_))
        ));
    }

    #[test]
    fn decodes_live_message() {
        let text = r#"{"kind":{"event":{"time":"2024-05-01T10:01:00.000001","event":"pass"}}}"#;
        let record = decode_live_message(text).unwrap();
        assert_eq!(record.category, Category::Pass);
        assert_eq!(record.timestamp.minute(), 1);
    }

    #[test]
    fn live_message_without_event_is_rejected() {
        assert!(decode_live_message(r#"{"kind":{}}"#).is_err());
        assert!(decode_live_message(r#"{"status":"running"}"#).is_err());
        assert!(decode_live_message("not json").is_err());
        assert!(matches!(
            decode_live_message(r#"{"kind":{"event":{"time":"2024-05-01T10:00:00","event":null}}}"#),
            Err(DecodeError::MissingField("event"))
        ));
    }

    #[test]
    fn batch_skips_bad_records() {
        let values = vec![
            json!({"time": "2024-05-01T10:00:00.5", "event": "pass"}),
            json!({"time": "not a time", "event": "pass"}),
            json!({"event": "pass"}),
            json!({"time": "2024-05-01T10:02:00.5", "event": {"blocked": {"rule": [1]}}}),
        ];
        let (records, dropped) = decode_records(values);
        assert_eq!(records.len(), 2);
        assert_eq!(dropped, 2);
        assert_eq!(records[1].category, Category::Blocked);
    }
}
