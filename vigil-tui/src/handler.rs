use std::time::Instant;

use log::error;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::{
    app::{ActivePopup, App, AppResult},
    event::Event,
    export::export,
    notification::{Notification, NotificationLevel},
};

pub fn handle_key_events(
    key_event: KeyEvent,
    app: &mut App,
    sender: kanal::Sender<Event>,
) -> AppResult<()> {
    if app.active_popup == Some(ActivePopup::Help) {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('?') => app.active_popup = None,
            KeyCode::Char('j') | KeyCode::Down => app.help.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => app.help.scroll_up(),
            KeyCode::Char('q') => app.quit(),
            _ => {}
        }
        return Ok(());
    }

    let now = Instant::now();

    match key_event.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Char('c') | KeyCode::Char('C') => {
            if key_event.modifiers == KeyModifiers::CONTROL {
                app.quit();
            }
        }

        KeyCode::Char('?') => app.active_popup = Some(ActivePopup::Help),

        KeyCode::Esc => {
            app.chart.cancel_brush();
        }

        KeyCode::Char('h') | KeyCode::Left => app.chart.cursor_prev(),
        KeyCode::Char('l') | KeyCode::Right => app.chart.cursor_next(),

        KeyCode::Char('H') => app.chart.pan(-0.25),
        KeyCode::Char('L') => app.chart.pan(0.25),

        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.chart.scale(0.5, now);
        }
        KeyCode::Char('-') => {
            app.chart.scale(2.0, now);
        }

        KeyCode::Char('b') => {
            app.chart.toggle_brush(now);
        }

        KeyCode::Enter => {
            if app.chart.brush().is_some() {
                app.chart.toggle_brush(now);
            } else {
                app.chart.select(None, None, now);
            }
        }

        KeyCode::Char('r') => app.chart.reset_view(),

        KeyCode::Char('s') => {
            if key_event.modifiers != KeyModifiers::CONTROL {
                return Ok(());
            }

            let aggregator = app.chart.aggregator();
            if aggregator.is_empty() {
                Notification::send("There are no events", NotificationLevel::Info, sender)?;
                return Ok(());
            }

            match export(aggregator) {
                Ok(path) => {
                    Notification::send(
                        format!("Series exported to {}", path.display()),
                        NotificationLevel::Info,
                        sender,
                    )?;
                }
                Err(e) => {
                    error!("Export failed. {e:#}");
                    Notification::send(e.to_string(), NotificationLevel::Error, sender)?;
                }
            }
        }

        _ => {}
    }

    Ok(())
}

pub fn handle_mouse_events(mouse_event: MouseEvent, app: &mut App) {
    if app.active_popup.is_some() {
        return;
    }

    let now = Instant::now();

    match mouse_event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.chart.mouse_down(mouse_event.column, mouse_event.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => app.chart.mouse_drag(mouse_event.column),
        MouseEventKind::Up(MouseButton::Left) => {
            app.chart.mouse_up(mouse_event.column, now);
        }
        MouseEventKind::ScrollUp => {
            app.chart.scale(0.8, now);
        }
        MouseEventKind::ScrollDown => {
            app.chart.scale(1.25, now);
        }
        _ => {}
    }
}
