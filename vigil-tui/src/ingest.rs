use std::{
    fs,
    io::{self, Read},
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;
use vigil_common::{EventQuery, EventRecord, decode_records};

use crate::config::EventSource;

/// Reads the stored events used to seed the chart.
pub fn read_events(source: &EventSource, query: &EventQuery) -> Result<Vec<EventRecord>> {
    let raw = match source {
        EventSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read events from {}", path.display()))?,
        EventSource::Stdin => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read events from stdin")?;
            raw
        }
    };

    parse_events(&raw, query)
}

/// Decodes a JSON array of stored events. Elements that fail to decode are
/// skipped, the rest are kept when they match `query`.
pub fn parse_events(raw: &str, query: &EventQuery) -> Result<Vec<EventRecord>> {
    let values: Vec<Value> =
        serde_json::from_str(raw).context("Stored events must be a JSON array")?;

    let (records, dropped) = decode_records(values);
    if dropped > 0 {
        warn!("Dropped {dropped} malformed stored events");
    }

    let records: Vec<EventRecord> = records.into_iter().filter(|r| query.matches(r)).collect();
    info!("Loaded {} stored events", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::Category;

    const STORED: &str = r#"[
        {"time": "2024-04-30T23:59:00", "event": "pass"},
        {"time": "2024-05-01T10:00:00.250", "event": {"blocked": {"rule": [], "addr": "10.0.0.1:80"}}},
        {"time": "not a date", "event": "pass"},
        {"event": "pass"},
        {"time": "2024-05-01T10:03:00", "event": "pass"}
    ]"#;

    #[test]
    fn skips_malformed_records() {
        let records = parse_events(STORED, &EventQuery::All).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].category, Category::Blocked);
    }

    #[test]
    fn applies_query() {
        let query: EventQuery = "2024-05-01".parse().unwrap();
        let records = parse_events(STORED, &query).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_events(r#"{"time": "2024-05-01T10:00:00"}"#, &EventQuery::All).is_err());
    }

    #[test]
    fn missing_file() {
        let source = EventSource::File("/nonexistent/vigil/events.json".into());
        let err = read_events(&source, &EventQuery::All).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vigil/events.json"));
    }
}
