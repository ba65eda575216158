use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, TimeDelta};

use crate::bucket::TimeRange;
use crate::config::{MAX_ZOOM_OUT, RESET_DEBOUNCE, VALUE_HEADROOM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOutcome {
    Zoomed,
    ResetScheduled,
    Ignored,
}

/// What part of the chart is on screen. Owned by the interaction layer; it
/// never touches the series itself.
#[derive(Debug, Clone)]
pub struct Viewport {
    visible: Option<TimeRange>,
    value: (f64, f64),
    widest: TimeDelta,
    pending_reset: Option<Instant>,
    debounce: Duration,
    headroom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            visible: None,
            value: (0.0, 0.0),
            widest: TimeDelta::zero(),
            pending_reset: None,
            debounce: RESET_DEBOUNCE,
            headroom: VALUE_HEADROOM,
        }
    }

    pub fn visible(&self) -> Option<TimeRange> {
        self.visible
    }

    pub fn value_range(&self) -> (f64, f64) {
        self.value
    }

    pub fn is_initialized(&self) -> bool {
        self.visible.is_some()
    }

    pub fn reset_pending(&self) -> bool {
        self.pending_reset.is_some()
    }

    pub fn reset_to_domain(&mut self, domain: TimeRange, max_value: u64) {
        self.visible = Some(domain);
        self.value = (0.0, max_value as f64 * self.headroom);
        self.widest = domain
            .span()
            .checked_mul(MAX_ZOOM_OUT)
            .unwrap_or(TimeDelta::MAX);
        self.pending_reset = None;
    }

    /// Narrows the visible range to a brush selection.
    ///
    /// A selection with a missing or collapsed bound is a click without a
    /// drag: nothing changes now, and a reset to the full domain is scheduled
    /// once the debounce delay has elapsed. Further empty selections while a
    /// reset is pending are ignored. A real selection cancels a pending reset.
    pub fn zoom_to(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        now: Instant,
    ) -> ZoomOutcome {
        match (start, end) {
            (Some(start), Some(end)) if start != end => {
                self.visible = Some(TimeRange::new(start, end));
                self.pending_reset = None;
                ZoomOutcome::Zoomed
            }
            _ => {
                if self.pending_reset.is_some() {
                    return ZoomOutcome::Ignored;
                }
                self.pending_reset = Some(now + self.debounce);
                ZoomOutcome::ResetScheduled
            }
        }
    }

    /// Returns true once when a scheduled reset is due. The caller then
    /// performs the reset with the current domain.
    pub fn take_due_reset(&mut self, now: Instant) -> bool {
        match self.pending_reset {
            Some(deadline) if now >= deadline => {
                self.pending_reset = None;
                true
            }
            _ => false,
        }
    }

    /// Widens the value axis when a new maximum no longer fits. Never narrows.
    pub fn grow_value_range(&mut self, max_value: u64) -> bool {
        let upper = max_value as f64 * self.headroom;
        if upper > self.value.1 {
            self.value.1 = upper;
            true
        } else {
            false
        }
    }

    /// Moves the visible window by `fraction` of its span. Negative values
    /// move towards older events. Returns false, leaving the window where it
    /// is, when the move would leave the calendar.
    pub fn pan(&mut self, fraction: f64) -> bool {
        let Some(visible) = self.visible else {
            return false;
        };
        let millis = (visible.span().num_milliseconds() as f64 * fraction).round() as i64;
        match TimeDelta::try_milliseconds(millis).and_then(|by| visible.checked_shift(by)) {
            Some(shifted) => {
                self.visible = Some(shifted);
                true
            }
            None => false,
        }
    }

    /// Zooms around the centre of the visible window. `factor` < 1 zooms in.
    /// Zooming out stops at `MAX_ZOOM_OUT` times the span of the last reset.
    pub fn scale(&mut self, factor: f64, now: Instant) -> ZoomOutcome {
        let Some(visible) = self.visible else {
            return ZoomOutcome::Ignored;
        };
        let span = visible.span().num_milliseconds();
        let target = ((span as f64 * factor).round() as i64).min(
            self.widest
                .num_milliseconds()
                .max(span),
        );
        let half = target / 2;
        if half <= 0 || target == span {
            return ZoomOutcome::Ignored;
        }

        let Some(half) = TimeDelta::try_milliseconds(half) else {
            return ZoomOutcome::Ignored;
        };
        let centre = visible.start + visible.span() / 2;
        match (
            centre.checked_sub_signed(half),
            centre.checked_add_signed(half),
        ) {
            (Some(start), Some(end)) => self.zoom_to(Some(start), Some(end), now),
            _ => ZoomOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::parse_timestamp;

    fn t(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn domain() -> TimeRange {
        TimeRange::new(t("2024-05-01T10:00:00"), t("2024-05-01T11:00:00"))
    }

    #[test]
    fn reset_applies_headroom() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 10);
        assert_eq!(viewport.visible(), Some(domain()));
        assert_eq!(viewport.value_range(), (0.0, 12.0));
    }

    #[test]
    fn zoom_to_selection() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 10);
        let now = Instant::now();

        let outcome = viewport.zoom_to(
            Some(t("2024-05-01T10:30:00")),
            Some(t("2024-05-01T10:10:00")),
            now,
        );

        assert_eq!(outcome, ZoomOutcome::Zoomed);
        assert_eq!(
            viewport.visible(),
            Some(TimeRange::new(t("2024-05-01T10:10:00"), t("2024-05-01T10:30:00")))
        );
        assert_eq!(viewport.value_range(), (0.0, 12.0));
    }

    #[test]
    fn empty_selection_resets_once_after_debounce() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 10);
        let zoomed = TimeRange::new(t("2024-05-01T10:10:00"), t("2024-05-01T10:20:00"));
        let start = Instant::now();
        viewport.zoom_to(Some(zoomed.start), Some(zoomed.end), start);

        let same = t("2024-05-01T10:15:00");
        assert_eq!(
            viewport.zoom_to(Some(same), Some(same), start),
            ZoomOutcome::ResetScheduled
        );
        assert_eq!(viewport.visible(), Some(zoomed));

        assert_eq!(
            viewport.zoom_to(None, None, start + Duration::from_millis(100)),
            ZoomOutcome::Ignored
        );
        assert_eq!(viewport.visible(), Some(zoomed));

        assert!(!viewport.take_due_reset(start + Duration::from_millis(200)));
        assert!(viewport.take_due_reset(start + Duration::from_millis(400)));
        assert!(!viewport.take_due_reset(start + Duration::from_millis(900)));
    }

    #[test]
    fn missing_bound_is_an_empty_selection() {
        let mut viewport = Viewport::new();
        let now = Instant::now();
        assert_eq!(
            viewport.zoom_to(Some(t("2024-05-01T10:00:00")), None, now),
            ZoomOutcome::ResetScheduled
        );
        assert!(viewport.reset_pending());
        assert!(!viewport.is_initialized());
    }

    #[test]
    fn reset_clears_pending() {
        let mut viewport = Viewport::new();
        let now = Instant::now();
        viewport.zoom_to(None, None, now);
        viewport.reset_to_domain(domain(), 1);
        assert!(!viewport.take_due_reset(now + Duration::from_secs(1)));
    }

    #[test]
    fn value_range_only_grows() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 5);

        assert!(viewport.grow_value_range(8));
        assert!(viewport.value_range().1 >= 8.0 * 1.2);
        let grown = viewport.value_range();

        assert!(!viewport.grow_value_range(6));
        assert_eq!(viewport.value_range(), grown);
        assert!(!viewport.grow_value_range(8));
        assert_eq!(viewport.value_range(), grown);
    }

    #[test]
    fn pan_keeps_span() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 1);
        viewport.pan(0.25);
        assert_eq!(
            viewport.visible(),
            Some(TimeRange::new(t("2024-05-01T10:15:00"), t("2024-05-01T11:15:00")))
        );
        viewport.pan(-0.5);
        assert_eq!(
            viewport.visible(),
            Some(TimeRange::new(t("2024-05-01T09:45:00"), t("2024-05-01T10:45:00")))
        );
    }

    #[test]
    fn selection_cancels_pending_reset() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 10);
        let start = Instant::now();

        viewport.zoom_to(None, None, start);
        let zoomed = TimeRange::new(t("2024-05-01T10:10:00"), t("2024-05-01T10:20:00"));
        assert_eq!(
            viewport.zoom_to(
                Some(zoomed.start),
                Some(zoomed.end),
                start + Duration::from_millis(100)
            ),
            ZoomOutcome::Zoomed
        );

        assert!(!viewport.reset_pending());
        assert!(!viewport.take_due_reset(start + Duration::from_millis(400)));
        assert_eq!(viewport.visible(), Some(zoomed));
    }

    #[test]
    fn zoom_out_stops_at_widest_view() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 1);
        let now = Instant::now();

        for _ in 0..100 {
            viewport.scale(2.0, now);
        }

        let visible = viewport.visible().unwrap();
        assert_eq!(visible.span(), domain().span() * MAX_ZOOM_OUT);
        assert_eq!(viewport.scale(2.0, now), ZoomOutcome::Ignored);
        assert_eq!(viewport.scale(0.5, now), ZoomOutcome::Zoomed);
    }

    #[test]
    fn pan_stops_at_the_calendar_edge() {
        let mut viewport = Viewport::new();
        let edge = TimeRange::new(NaiveDateTime::MAX - TimeDelta::hours(1), NaiveDateTime::MAX);
        viewport.reset_to_domain(edge, 1);

        assert!(!viewport.pan(0.5));
        assert_eq!(viewport.visible(), Some(edge));
        assert!(viewport.pan(-0.5));
    }

    #[test]
    fn scale_zooms_around_centre() {
        let mut viewport = Viewport::new();
        viewport.reset_to_domain(domain(), 1);
        assert_eq!(viewport.scale(0.5, Instant::now()), ZoomOutcome::Zoomed);
        assert_eq!(
            viewport.visible(),
            Some(TimeRange::new(t("2024-05-01T10:15:00"), t("2024-05-01T10:45:00")))
        );
    }
}
