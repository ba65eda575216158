use core::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{DecodeError, EventRecord, parse_timestamp};

/// Which stored events to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventQuery {
    #[default]
    All,
    Since(NaiveDateTime),
}

impl EventQuery {
    pub fn matches(&self, record: &EventRecord) -> bool {
        match self {
            EventQuery::All => true,
            EventQuery::Since(since) => record.timestamp >= *since,
        }
    }
}

/// Accepts a full timestamp or a bare `YYYY-MM-DD` date (midnight).
impl FromStr for EventQuery {
    type Err = DecodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            return Ok(EventQuery::Since(date.and_time(chrono::NaiveTime::MIN)));
        }
        parse_timestamp(s).map(EventQuery::Since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    #[test]
    fn date_means_midnight() {
        let query = EventQuery::from_str("2024-05-01").unwrap();
        let midnight = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(query, EventQuery::Since(midnight));
    }

    #[test]
    fn since_is_inclusive() {
        let query = EventQuery::from_str("2024-05-01T10:00:00").unwrap();
        let at = parse_timestamp("2024-05-01T10:00:00").unwrap();
        let before = parse_timestamp("2024-05-01T09:59:59.999").unwrap();

        assert!(query.matches(&EventRecord::new(at, Category::Pass)));
        assert!(!query.matches(&EventRecord::new(before, Category::Pass)));
        assert!(EventQuery::All.matches(&EventRecord::new(before, Category::Pass)));
    }
}
