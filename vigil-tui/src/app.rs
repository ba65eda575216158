use std::{error, time::Instant};

use log::info;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Stylize,
    text::{Line, Span},
    widgets::Paragraph,
};
use vigil_common::{Category, EventRecord};

use crate::{
    aggregator::SeriesChangeSet,
    chart::ChartBinding,
    config::{Config, RECENT_EVENTS_CAPACITY},
    event::Event,
    help::Help,
    live::{FeedState, LiveFeed},
    notification::Notification,
    recent::RecentEvents,
};

pub type AppResult<T> = std::result::Result<T, Box<dyn error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivePopup {
    Help,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub help: Help,
    pub chart: ChartBinding,
    pub feed: Option<LiveFeed>,
    pub recent: RecentEvents,
    pub notifications: Vec<Notification>,
    pub active_popup: Option<ActivePopup>,
    pub notification_sender: kanal::Sender<Event>,
}

impl App {
    pub fn new(config: &Config, notification_sender: kanal::Sender<Event>) -> Self {
        let feed = config
            .url
            .clone()
            .map(|url| LiveFeed::connect(url, notification_sender.clone()));

        Self {
            running: true,
            help: Help::new(),
            chart: ChartBinding::new(config.variant),
            feed,
            recent: RecentEvents::new(RECENT_EVENTS_CAPACITY),
            notifications: Vec::new(),
            active_popup: None,
            notification_sender,
        }
    }

    pub fn load(&mut self, events: Vec<EventRecord>) {
        self.chart.load(events);
    }

    /// Folds whatever the live feed buffered since the last call.
    pub fn ingest(&mut self) -> SeriesChangeSet {
        let Some(feed) = &self.feed else {
            return SeriesChangeSet::default();
        };
        let buffer = feed.drain();
        self.recent.extend(&buffer);
        self.chart.ingest(buffer)
    }

    pub fn tick(&mut self) {
        self.notifications.retain_mut(Notification::tick);

        self.chart.tick(Instant::now());
    }

    /// Shows a toast. A repeat of one already on screen restarts its timer
    /// instead of stacking a copy, so a flapping socket shows one error.
    pub fn notify(&mut self, notification: Notification) {
        match self.notifications.iter_mut().find(|n| n.repeats(&notification)) {
            Some(shown) => shown.ttl = notification.ttl,
            None => self.notifications.push(notification),
        }
    }

    pub fn quit(&mut self) {
        if let Some(feed) = &self.feed {
            feed.close();
        }
        info!("Quitting");
        self.running = false;
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let (status_block, main_block) = {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Fill(1)])
                .split(frame.area());
            (chunks[0], chunks[1])
        };

        let (chart_block, recent_block) = {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Fill(1), Constraint::Length(30)])
                .split(main_block);
            (chunks[0], chunks[1])
        };

        self.render_status(frame, status_block);
        self.chart.render(frame, chart_block);
        self.recent.render(frame, recent_block);
    }

    fn render_status(&self, frame: &mut Frame, block: Rect) {
        let feed = match self.feed.as_ref().map(LiveFeed::state) {
            None => Span::from(" offline ").dark_gray(),
            Some(FeedState::Connecting) => Span::from(" connecting ").yellow(),
            Some(FeedState::Open) => Span::from(" live ").green().bold(),
            Some(FeedState::Closed) => Span::from(" closed ").red(),
        };

        let pending = self.feed.as_ref().map_or(0, LiveFeed::pending);
        let aggregator = self.chart.aggregator();
        let totals = aggregator.totals();
        let total_of = |category: Category| {
            totals
                .iter()
                .find(|(c, _)| *c == category)
                .map_or(0, |(_, n)| *n)
        };

        let line = Line::from(vec![
            feed,
            Span::from(format!(" {} pending ", pending)),
            Span::from(format!(" {} events ", aggregator.event_count())).bold(),
            Span::from(format!(" {} pass ", total_of(Category::Pass))).green(),
            Span::from(format!(" {} blocked ", total_of(Category::Blocked))).red(),
            Span::from(format!(" {} buckets ", aggregator.len())),
            Span::from(format!(" {} ", self.chart.variant())).dark_gray(),
            Span::from(" ? help ").dark_gray(),
        ]);

        frame.render_widget(Paragraph::new(line), block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cli, config::NOTIFICATION_TICKS, notification::NotificationLevel};

    const BLOCKED: &str = r#"{"kind":{"event":{"time":"2024-05-01T10:02:00","event":{"blocked":{"rule":[],"addr":"10.0.0.9:22"}}}}}"#;

    fn app() -> (App, kanal::Receiver<Event>) {
        let config = Config::from_matches(&cli::cli().get_matches_from(["vigil"]));
        let (sender, receiver) = kanal::unbounded();
        (App::new(&config, sender), receiver)
    }

    #[test]
    fn ingest_without_feed_is_noop() {
        let (mut app, _receiver) = app();
        assert!(app.ingest().is_empty());
        assert!(app.recent.is_empty());
    }

    #[test]
    fn ingest_drains_feed_into_chart_and_log() {
        let (mut app, _receiver) = app();
        let feed = LiveFeed::new();
        feed.open();
        feed.push_message(BLOCKED);
        feed.push_message(BLOCKED);
        app.feed = Some(feed.clone());

        let changes = app.ingest();

        assert_eq!(changes.created.len(), 1);
        assert_eq!(feed.pending(), 0);
        assert_eq!(app.recent.len(), 2);
        assert_eq!(app.chart.aggregator().event_count(), 2);
        assert!(app.chart.viewport().is_initialized());
    }

    #[test]
    fn quit_closes_feed() {
        let (mut app, _receiver) = app();
        let feed = LiveFeed::new();
        feed.open();
        app.feed = Some(feed.clone());

        app.quit();

        assert!(!app.running);
        assert_eq!(feed.state(), FeedState::Closed);
    }

    #[test]
    fn expired_notifications_are_dropped() {
        let (mut app, _receiver) = app();
        app.notifications.push(Notification {
            message: "exported".to_string(),
            level: NotificationLevel::Info,
            ttl: 1,
        });
        app.tick();
        assert!(app.notifications.is_empty());
    }

    #[test]
    fn repeated_notification_restarts_timer() {
        let (mut app, _receiver) = app();
        app.notify(Notification::new("socket closed", NotificationLevel::Error));
        app.tick();
        app.tick();
        app.notify(Notification::new("socket closed", NotificationLevel::Error));
        app.notify(Notification::new("exported", NotificationLevel::Info));

        assert_eq!(app.notifications.len(), 2);
        assert_eq!(app.notifications[0].ttl, NOTIFICATION_TICKS);
    }
}
