use std::{io, panic};

use ratatui::{
    Terminal,
    backend::Backend,
    crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    },
};

use crate::{
    app::{App, AppResult},
    event::EventHandler,
    live::LiveFeed,
    ui,
};

/// Closes the live feed when the terminal is handed back, so the socket
/// reader stops on a clean exit and on a panic alike.
#[derive(Debug, Clone, Default)]
struct FeedGuard(Option<LiveFeed>);

impl FeedGuard {
    fn release(&self) {
        if let Some(feed) = &self.0 {
            feed.close();
        }
    }
}

/// Terminal in raw mode on the alternate screen, with mouse reporting on so
/// the chart can be brushed.
#[derive(Debug)]
pub struct Tui<B: Backend> {
    terminal: Terminal<B>,
    pub events: EventHandler,
    guard: FeedGuard,
}

impl<B: Backend> Tui<B> {
    pub fn new(terminal: Terminal<B>, events: EventHandler, feed: Option<LiveFeed>) -> Self {
        Self {
            terminal,
            events,
            guard: FeedGuard(feed),
        }
    }

    pub fn init(&mut self) -> AppResult<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;

        let guard = self.guard.clone();
        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic| {
            guard.release();
            if let Err(e) = Self::reset() {
                eprintln!("Failed to restore the terminal: {e}");
            }
            panic_hook(panic);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> AppResult<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }

    fn reset() -> AppResult<()> {
        terminal::disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }

    pub fn exit(&mut self) -> AppResult<()> {
        self.guard.release();
        Self::reset()?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
