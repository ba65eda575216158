use std::collections::VecDeque;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Borders, Cell, Padding, Row, Table},
};
use vigil_common::{Category, EventRecord};

/// Latest live events, newest first, bounded to a fixed capacity.
#[derive(Debug, Clone)]
pub struct RecentEvents {
    capacity: usize,
    events: VecDeque<EventRecord>,
}

impl RecentEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Records `batch` in arrival order.
    pub fn extend(&mut self, batch: &[EventRecord]) {
        for record in batch {
            if self.events.len() == self.capacity {
                self.events.pop_back();
            }
            self.events.push_front(*record);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn render(&self, frame: &mut Frame, block: Rect) {
        let rows = self
            .events
            .iter()
            .take(block.height.saturating_sub(2) as usize)
            .map(|record| {
                let color = match record.category {
                    Category::Pass => Color::Green,
                    Category::Blocked => Color::Red,
                    Category::Other => Color::Gray,
                };
                Row::new(vec![
                    Cell::from(record.timestamp.format("%m-%d %H:%M:%S").to_string()),
                    Cell::from(record.category.to_string()).fg(color),
                ])
            });

        let table = Table::new(rows, [Constraint::Length(14), Constraint::Fill(1)])
            .header(Row::new(vec!["Time", "Event"]).bold().yellow())
            .block(
                Block::default()
                    .title(" Live ")
                    .title_style(Style::default().bold().fg(Color::Green))
                    .title_alignment(Alignment::Center)
                    .padding(Padding::horizontal(1))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Thick)
                    .border_style(Style::default().fg(Color::Green)),
            );

        frame.render_widget(table, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::parse_timestamp;

    fn ev(s: &str, category: Category) -> EventRecord {
        EventRecord::new(parse_timestamp(s).unwrap(), category)
    }

    #[test]
    fn newest_first_and_bounded() {
        let mut recent = RecentEvents::new(2);
        recent.extend(&[
            ev("2024-05-01T10:00:00", Category::Pass),
            ev("2024-05-01T10:01:00", Category::Blocked),
            ev("2024-05-01T10:02:00", Category::Other),
        ]);

        assert_eq!(recent.len(), 2);
        let categories: Vec<Category> = recent.iter().map(|r| r.category).collect();
        assert_eq!(categories, vec![Category::Other, Category::Blocked]);
    }
}
