use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::{app::AppResult, config::NOTIFICATION_TICKS, event::Event};

/// Toasts never grow wider than this, long socket errors wrap instead.
const MAX_WIDTH: u16 = 60;

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    /// Remaining UI ticks.
    pub ttl: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationLevel {
    Error,
    Warning,
    Info,
}

impl NotificationLevel {
    fn color(self) -> Color {
        match self {
            NotificationLevel::Info => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        }
    }

    fn title(self) -> &'static str {
        match self {
            NotificationLevel::Info => "Info",
            NotificationLevel::Warning => "Warning",
            NotificationLevel::Error => "Error",
        }
    }
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            ttl: NOTIFICATION_TICKS,
        }
    }

    /// Counts one UI tick down. False once the toast has expired.
    pub fn tick(&mut self) -> bool {
        self.ttl = self.ttl.saturating_sub(1);
        self.ttl > 0
    }

    /// Same text at the same level, so showing both would only repeat it.
    pub fn repeats(&self, other: &Notification) -> bool {
        self.level == other.level && self.message == other.message
    }

    pub fn render(&self, index: usize, frame: &mut Frame) {
        let color = self.level.color();

        let mut text = Text::from(vec![
            Line::from(self.level.title())
                .style(Style::new().fg(color).add_modifier(Modifier::BOLD)),
        ]);
        text.extend(Text::from(self.message.as_str()));

        let width = (text.width() as u16 + 4).min(MAX_WIDTH);
        let inner = width.saturating_sub(4).max(1) as usize;
        let wrapped: usize = self
            .message
            .lines()
            .map(|line| line.chars().count().div_ceil(inner).max(1))
            .sum();
        let height = wrapped as u16 + 3;

        let block = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Thick)
                    .border_style(Style::default().fg(color)),
            );

        let area = notification_rect(index as u16, height, width, frame.area());

        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
    }

    pub fn send(
        message: impl Into<String>,
        level: NotificationLevel,
        sender: kanal::Sender<Event>,
    ) -> AppResult<()> {
        sender.send(Event::Notification(Notification::new(message, level)))?;
        Ok(())
    }
}

/// Stacks toasts in the top right corner, below the status line.
pub fn notification_rect(offset: u16, height: u16, width: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1 + height * offset),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Length(2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_configured_ticks() {
        let mut notification = Notification::new("exported", NotificationLevel::Info);
        for _ in 1..NOTIFICATION_TICKS {
            assert!(notification.tick());
        }
        assert!(!notification.tick());
        assert!(!notification.tick());
    }

    #[test]
    fn send_puts_toast_on_channel() {
        let (sender, receiver) = kanal::unbounded();
        Notification::send("socket closed", NotificationLevel::Warning, sender).unwrap();
        match receiver.try_recv().unwrap() {
            Some(Event::Notification(n)) => {
                assert_eq!(n.message, "socket closed");
                assert_eq!(n.level, NotificationLevel::Warning);
                assert_eq!(n.ttl, NOTIFICATION_TICKS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn repeats_needs_same_level_and_text() {
        let a = Notification::new("socket closed", NotificationLevel::Error);
        assert!(a.repeats(&Notification::new("socket closed", NotificationLevel::Error)));
        assert!(!a.repeats(&Notification::new("socket closed", NotificationLevel::Info)));
        assert!(!a.repeats(&Notification::new("export failed", NotificationLevel::Error)));
    }

    #[test]
    fn rect_sits_below_status_line() {
        let screen = Rect::new(0, 0, 80, 24);
        let first = notification_rect(0, 4, 20, screen);
        assert_eq!(first, Rect::new(58, 1, 20, 4));
        let second = notification_rect(1, 4, 20, screen);
        assert_eq!(second.y, 5);
    }
}
