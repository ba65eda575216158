//! Behavioural constants and the typed view of the command line.

use std::{num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::ArgMatches;
use vigil_common::EventQuery;

use crate::{bucket::BucketWidth, chart::ChartVariant};

/// UI refresh cadence, in milliseconds.
pub const TICK_RATE: u64 = 40;

/// How long a toast stays on screen.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// `NOTIFICATION_TTL` counted in UI ticks.
pub const NOTIFICATION_TICKS: u16 = (NOTIFICATION_TTL.as_millis() as u64 / TICK_RATE) as u16;

/// How often buffered live events are folded into the series.
pub const INGEST_PERIOD: Duration = Duration::from_secs(10);

/// A click without a drag resets the zoom after this delay.
pub const RESET_DEBOUNCE: Duration = Duration::from_millis(350);

/// Margin above the tallest bucket on the value axis.
pub const VALUE_HEADROOM: f64 = 1.2;

/// Widest time window, as a multiple of the span shown after a reset.
pub const MAX_ZOOM_OUT: i32 = 4;

pub const DUAL_BUCKET_WIDTH: BucketWidth = match NonZeroU32::new(5) {
    Some(minutes) => BucketWidth::from_minutes(minutes),
    None => unreachable!(),
};

pub const COUNT_BUCKET_WIDTH: BucketWidth = match NonZeroU32::new(15) {
    Some(minutes) => BucketWidth::from_minutes(minutes),
    None => unreachable!(),
};

/// Number of raw events kept for the event log pane.
pub const RECENT_EVENTS_CAPACITY: usize = 256;

/// Read timeout of the live socket; bounds how long closing the feed takes.
pub const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub events: Option<EventSource>,
    pub url: Option<String>,
    pub variant: ChartVariant,
    pub query: EventQuery,
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let events = matches
            .get_one::<String>("events")
            .map(|path| match path.as_str() {
                "-" => EventSource::Stdin,
                path => EventSource::File(PathBuf::from(path)),
            });

        let url = matches.get_one::<String>("url").cloned();

        let variant = matches
            .get_one::<String>("variant")
            .and_then(|v| ChartVariant::from_str(v).ok())
            .unwrap_or_default();

        let query = matches
            .get_one::<EventQuery>("since")
            .copied()
            .unwrap_or_default();

        Self {
            events,
            url,
            variant,
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    #[test]
    fn notification_ticks_follow_tick_rate() {
        assert_eq!(NOTIFICATION_TICKS, 75);
        assert_eq!(
            Duration::from_millis(TICK_RATE * NOTIFICATION_TICKS as u64),
            NOTIFICATION_TTL
        );
    }

    #[test]
    fn defaults() {
        let matches = cli::cli().get_matches_from(["vigil"]);
        let config = Config::from_matches(&matches);
        assert_eq!(config.events, None);
        assert_eq!(config.url, None);
        assert_eq!(config.variant, ChartVariant::Dual);
        assert_eq!(config.query, EventQuery::All);
    }

    #[test]
    fn full_command_line() {
        let matches = cli::cli().get_matches_from([
            "vigil",
            "--events",
            "-",
            "--url",
            "ws://10.0.0.2:9000/firewall/events/ws",
            "--variant",
            "count",
            "--since",
            "2024-05-01",
        ]);
        let config = Config::from_matches(&matches);
        assert_eq!(config.events, Some(EventSource::Stdin));
        assert_eq!(
            config.url.as_deref(),
            Some("ws://10.0.0.2:9000/firewall/events/ws")
        );
        assert_eq!(config.variant, ChartVariant::Count);
        assert!(matches!(config.query, EventQuery::Since(_)));
    }

    #[test]
    fn bucket_widths() {
        assert_eq!(DUAL_BUCKET_WIDTH.as_millis(), 5 * 60_000);
        assert_eq!(COUNT_BUCKET_WIDTH.as_millis(), 15 * 60_000);
    }
}
