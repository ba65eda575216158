use core::fmt::Display;
use std::{str::FromStr, time::Instant};

use chrono::{NaiveDateTime, TimeDelta};
use log::debug;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Padding, Paragraph},
};
use thiserror::Error;
use vigil_common::{Category, EventRecord};

use crate::{
    aggregator::{AggregateError, Aggregator, BucketCounters, SeriesChangeSet},
    bucket::{BucketKey, BucketWidth, TimeRange},
    config::{COUNT_BUCKET_WIDTH, DUAL_BUCKET_WIDTH},
    updater::IncrementalUpdater,
    viewport::{Viewport, ZoomOutcome},
};

#[derive(Debug, Error, PartialEq)]
#[error("unknown chart variant {0}, expected dual or count")]
pub struct UnknownVariant(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartVariant {
    /// Pass and blocked lines over 5 minute buckets.
    #[default]
    Dual,
    /// A single event count line over 15 minute buckets.
    Count,
}

impl ChartVariant {
    pub fn width(self) -> BucketWidth {
        match self {
            ChartVariant::Dual => DUAL_BUCKET_WIDTH,
            ChartVariant::Count => COUNT_BUCKET_WIDTH,
        }
    }

    /// Categories drawn as their own line. Empty for the count chart, which
    /// plots bucket totals.
    pub fn categories(self) -> &'static [Category] {
        match self {
            ChartVariant::Dual => &[Category::Pass, Category::Blocked],
            ChartVariant::Count => &[],
        }
    }

    pub fn max_value(self, aggregator: &Aggregator) -> u64 {
        match self {
            ChartVariant::Dual => aggregator.max_value(self.categories()),
            ChartVariant::Count => aggregator.max_total(),
        }
    }

    fn lines(self) -> &'static [(&'static str, Option<Category>, Color)] {
        match self {
            ChartVariant::Dual => &[
                ("pass", Some(Category::Pass), Color::Green),
                ("blocked", Some(Category::Blocked), Color::Red),
            ],
            ChartVariant::Count => &[("events", None, Color::Cyan)],
        }
    }
}

impl Display for ChartVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChartVariant::Dual => write!(f, "dual"),
            ChartVariant::Count => write!(f, "count"),
        }
    }
}

impl FromStr for ChartVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dual" => Ok(ChartVariant::Dual),
            "count" => Ok(ChartVariant::Count),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// An in-progress range selection. `anchor` is where it started and `head`
/// follows the mouse or the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brush {
    pub anchor: NaiveDateTime,
    pub head: NaiveDateTime,
}

/// One drawn run of consecutive buckets for one line of the chart.
#[derive(Debug, Clone)]
struct Trace {
    name: Option<&'static str>,
    color: Color,
    graph_type: GraphType,
    points: Vec<(f64, f64)>,
}

/// Draws the aggregated series within the viewport, and turns keyboard and
/// mouse input into viewport changes.
#[derive(Debug)]
pub struct ChartBinding {
    variant: ChartVariant,
    aggregator: Aggregator,
    viewport: Viewport,
    updater: IncrementalUpdater,
    traces: Vec<Trace>,
    cursor: Option<BucketKey>,
    brush: Option<Brush>,
    plot: Rect,
}

impl ChartBinding {
    pub fn new(variant: ChartVariant) -> Self {
        Self {
            variant,
            aggregator: Aggregator::new(variant.width()),
            viewport: Viewport::new(),
            updater: IncrementalUpdater::new(variant),
            traces: Vec::new(),
            cursor: None,
            brush: None,
            plot: Rect::default(),
        }
    }

    pub fn variant(&self) -> ChartVariant {
        self.variant
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> Option<BucketKey> {
        self.cursor
    }

    pub fn brush(&self) -> Option<Brush> {
        self.brush
    }

    /// Replaces the series with `events` and shows all of it.
    pub fn load(&mut self, events: Vec<EventRecord>) {
        let series = self.aggregator.load(events);
        debug!("loaded {} buckets", series.len());
        self.rebuild_traces();
        self.viewport = Viewport::new();
        self.reset_view();
        self.cursor = self.aggregator.last_key();
        self.brush = None;
    }

    pub fn ingest(&mut self, buffer: Vec<EventRecord>) -> SeriesChangeSet {
        let changes = self
            .updater
            .tick(&mut self.aggregator, &mut self.viewport, buffer);
        if !changes.is_empty() {
            self.rebuild_traces();
        }
        if self.cursor.is_none() {
            self.cursor = self.aggregator.last_key();
        }
        changes
    }

    fn rebuild_traces(&mut self) {
        let segments = self.aggregator.segments();
        self.traces.clear();
        for (name, category, color) in self.variant.lines() {
            for (index, segment) in segments.iter().enumerate() {
                let points: Vec<(f64, f64)> = segment
                    .iter()
                    .map(|p| (seconds(p.key.start()), value(&p.counters, *category)))
                    .collect();
                let graph_type = if points.len() == 1 {
                    GraphType::Scatter
                } else {
                    GraphType::Line
                };
                self.traces.push(Trace {
                    name: (index == 0).then_some(*name),
                    color: *color,
                    graph_type,
                    points,
                });
            }
        }
    }

    /// Applies a debounced reset once it is due.
    pub fn tick(&mut self, now: Instant) {
        if self.viewport.take_due_reset(now) {
            self.reset_view();
        }
    }

    pub fn reset_view(&mut self) {
        if let Ok(domain) = self.aggregator.domain() {
            let max_value = self.variant.max_value(&self.aggregator);
            self.viewport.reset_to_domain(domain, max_value);
        }
    }

    pub fn select(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        now: Instant,
    ) -> ZoomOutcome {
        self.viewport.zoom_to(start, end, now)
    }

    pub fn pan(&mut self, fraction: f64) {
        self.viewport.pan(fraction);
    }

    pub fn scale(&mut self, factor: f64, now: Instant) -> ZoomOutcome {
        self.viewport.scale(factor, now)
    }

    pub fn cursor_next(&mut self) {
        self.cursor = match self.cursor {
            Some(key) => self.aggregator.next_key(&key).or(Some(key)),
            None => self.aggregator.first_key(),
        };
        self.follow_cursor();
    }

    pub fn cursor_prev(&mut self) {
        self.cursor = match self.cursor {
            Some(key) => self.aggregator.prev_key(&key).or(Some(key)),
            None => self.aggregator.last_key(),
        };
        self.follow_cursor();
    }

    /// Starts a keyboard selection on the cursor bucket, or commits the
    /// running one.
    pub fn toggle_brush(&mut self, now: Instant) -> Option<ZoomOutcome> {
        match self.brush.take() {
            Some(brush) => Some(self.select(Some(brush.anchor), Some(brush.head), now)),
            None => {
                let width = self.aggregator.width();
                self.brush = self.cursor.map(|key| Brush {
                    anchor: key.start(),
                    head: key.end(width),
                });
                None
            }
        }
    }

    pub fn cancel_brush(&mut self) -> bool {
        self.brush.take().is_some()
    }

    pub fn mouse_down(&mut self, column: u16, row: u16) {
        if !self.plot.contains(Position::new(column, row)) {
            return;
        }
        self.brush = self.time_at(column).map(|t| Brush { anchor: t, head: t });
    }

    pub fn mouse_drag(&mut self, column: u16) {
        let head = self.time_at(column);
        if let (Some(brush), Some(head)) = (self.brush.as_mut(), head) {
            brush.head = head;
        }
    }

    /// Ends a mouse selection. Releasing where the press happened is a plain
    /// click, which the viewport treats as an empty selection.
    pub fn mouse_up(&mut self, column: u16, now: Instant) -> Option<ZoomOutcome> {
        self.mouse_drag(column);
        let brush = self.brush.take()?;
        Some(self.select(Some(brush.anchor), Some(brush.head), now))
    }

    fn follow_cursor(&mut self) {
        let (Some(key), Some(brush)) = (self.cursor, self.brush.as_mut()) else {
            return;
        };
        brush.head = if key.start() >= brush.anchor {
            key.end(self.aggregator.width())
        } else {
            key.start()
        };
    }

    fn time_at(&self, column: u16) -> Option<NaiveDateTime> {
        let visible = self.viewport.visible()?;
        if self.plot.width < 2 {
            return None;
        }
        let offset = column
            .saturating_sub(self.plot.x)
            .min(self.plot.width - 1);
        let fraction = offset as f64 / (self.plot.width - 1) as f64;
        let millis = (visible.span().num_milliseconds() as f64 * fraction).round() as i64;
        Some(visible.start + TimeDelta::milliseconds(millis))
    }

    pub fn render(&mut self, frame: &mut Frame, block: Rect) {
        let (chart_block, info_block) = {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1), Constraint::Length(1)])
                .split(block);
            (chunks[0], chunks[1])
        };

        let frame_block = Block::default()
            .title(format!(" Firewall events, {} buckets ", self.aggregator.width()))
            .title_style(Style::default().bold().fg(Color::Green))
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1))
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(Color::Green));

        let domain = match self.aggregator.domain() {
            Ok(domain) => domain,
            Err(AggregateError::EmptyDomain) => {
                self.plot = Rect::default();
                let placeholder = Paragraph::new("No events")
                    .alignment(Alignment::Center)
                    .block(frame_block.padding(Padding::top(chart_block.height / 3)));
                frame.render_widget(placeholder, chart_block);
                return;
            }
        };

        let visible = self.viewport.visible().unwrap_or(domain);
        let (_, upper) = self.viewport.value_range();
        let upper = if upper > 0.0 { upper } else { 1.0 };

        let cursor_data = self
            .cursor
            .filter(|key| visible.contains(key.start()))
            .map(|key| vertical(key.start(), upper));

        let brush_data = self
            .brush
            .map(|brush| (vertical(brush.anchor, upper), vertical(brush.head, upper)));

        let mut datasets: Vec<Dataset> = self
            .traces
            .iter()
            .map(|trace| {
                let dataset = Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(trace.graph_type)
                    .style(Style::default().fg(trace.color))
                    .data(&trace.points);
                match trace.name {
                    Some(name) => dataset.name(name),
                    None => dataset,
                }
            })
            .collect();

        if let Some(cursor) = &cursor_data {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().yellow())
                    .data(cursor),
            );
        }

        if let Some((anchor, head)) = &brush_data {
            for edge in [anchor, head] {
                datasets.push(
                    Dataset::default()
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().magenta())
                        .data(edge),
                );
            }
        }

        let x_axis = Axis::default()
            .style(Style::default().white())
            .bounds([seconds(visible.start), seconds(visible.end)])
            .labels(time_labels(visible));

        let y_labels = [
            "0".to_string(),
            format!("{:.0}", upper / 2.0),
            format!("{upper:.0}"),
        ];
        let y_label_width = y_labels.iter().map(String::len).max().unwrap_or(1) as u16 + 1;

        let y_axis = Axis::default()
            .style(Style::default().white())
            .bounds([0.0, upper])
            .labels(y_labels);

        let inner = frame_block.inner(chart_block);
        self.plot = Rect {
            x: inner.x + y_label_width,
            y: inner.y,
            width: inner.width.saturating_sub(y_label_width),
            height: inner.height.saturating_sub(2),
        };

        let chart = Chart::new(datasets)
            .block(frame_block)
            .x_axis(x_axis)
            .y_axis(y_axis);

        frame.render_widget(chart, chart_block);
        frame.render_widget(Paragraph::new(self.info_line()), info_block);
    }

    fn info_line(&self) -> Line<'static> {
        let Some(key) = self.cursor else {
            return Line::default();
        };
        let width = self.aggregator.width();
        let counters = self.aggregator.get(&key).copied().unwrap_or_default();

        let mut spans = vec![
            Span::from(format!(
                " {} - {} ",
                key.start().format("%Y-%m-%d %H:%M"),
                key.end(width).format("%H:%M")
            ))
            .bold(),
        ];
        spans.push(Span::from(format!(" pass {} ", counters.get(Category::Pass))).green());
        spans.push(Span::from(format!(" blocked {} ", counters.get(Category::Blocked))).red());
        spans.push(Span::from(format!(" total {} ", counters.total())).cyan());

        if let Some(brush) = self.brush {
            spans.push(
                Span::from(format!(
                    " selecting {} - {} ",
                    brush.anchor.min(brush.head).format("%H:%M"),
                    brush.anchor.max(brush.head).format("%H:%M")
                ))
                .magenta(),
            );
        }

        Line::from(spans)
    }
}

fn seconds(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp_millis() as f64 / 1000.0
}

fn value(counters: &BucketCounters, category: Option<Category>) -> f64 {
    match category {
        Some(category) => counters.get(category) as f64,
        None => counters.total() as f64,
    }
}

fn vertical(t: NaiveDateTime, upper: f64) -> Vec<(f64, f64)> {
    vec![(seconds(t), 0.0), (seconds(t), upper)]
}

fn time_labels(visible: TimeRange) -> Vec<String> {
    let format = if visible.span() > TimeDelta::days(1) {
        "%m-%d %H:%M"
    } else {
        "%H:%M"
    };
    let middle = visible.start + visible.span() / 2;
    [visible.start, middle, visible.end]
        .iter()
        .map(|t| t.format(format).to_string())
        .collect()
}
