use core::fmt::Display;
use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BucketError {
    #[error("bucket width must be strictly positive, got {0}")]
    NonPositiveWidth(TimeDelta),
}

/// Fixed aggregation grain of a chart. Strictly positive, so bucketing never
/// fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BucketWidth {
    millis: i64,
}

impl BucketWidth {
    pub fn new(width: TimeDelta) -> Result<Self, BucketError> {
        let millis = width.num_milliseconds();
        if millis <= 0 {
            return Err(BucketError::NonPositiveWidth(width));
        }
        Ok(Self { millis })
    }

    pub const fn from_minutes(minutes: NonZeroU32) -> Self {
        Self {
            millis: minutes.get() as i64 * 60_000,
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    pub fn as_delta(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.millis)
    }
}

impl Display for BucketWidth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.millis {
            m if m % 3_600_000 == 0 => write!(f, "{}h", m / 3_600_000),
            m if m % 60_000 == 0 => write!(f, "{}m", m / 60_000),
            m if m % 1000 == 0 => write!(f, "{}s", m / 1000),
            m => write!(f, "{m}ms"),
        }
    }
}

/// Start of the interval an event falls in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(NaiveDateTime);

impl BucketKey {
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }

    /// Saturates at `NaiveDateTime::MAX` for the last bucket of the calendar.
    pub fn end(&self, width: BucketWidth) -> NaiveDateTime {
        self.0
            .checked_add_signed(width.as_delta())
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// True when `other` is the bucket immediately following this one.
    pub fn is_followed_by(&self, other: &BucketKey, width: BucketWidth) -> bool {
        other.0 - self.0 == width.as_delta()
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// `floor(timestamp / width) * width`, on epoch milliseconds.
pub fn bucket_of(timestamp: NaiveDateTime, width: BucketWidth) -> BucketKey {
    let millis = timestamp.and_utc().timestamp_millis();
    let floored = millis.div_euclid(width.millis) * width.millis;
    let start = DateTime::from_timestamp_millis(floored)
        .map_or(NaiveDateTime::MIN, |start| start.naive_utc());
    BucketKey(start)
}

/// Half-open `[start, end)` time interval.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    /// None when either bound would leave the calendar.
    pub fn checked_shift(&self, by: TimeDelta) -> Option<Self> {
        Some(Self {
            start: self.start.checked_add_signed(by)?,
            end: self.end.checked_add_signed(by)?,
        })
    }
}
