use crate::app::AppResult;
use crate::notification::Notification;
use log::error;
use ratatui::crossterm::event::{
    self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent,
};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub enum Event {
    Tick,
    Ingest,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Notification(Notification),
}

#[allow(dead_code)]
#[derive(Debug)]
pub struct EventHandler {
    pub sender: kanal::Sender<Event>,
    pub receiver: kanal::Receiver<Event>,
    pub handler: thread::JoinHandle<()>,
}

impl EventHandler {
    /// Emits terminal input as it arrives, `Tick` every `tick_rate`
    /// milliseconds and `Ingest` every `ingest_period`.
    pub fn new(tick_rate: u64, ingest_period: Duration) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = kanal::unbounded();
        let handler = {
            let sender = sender.clone();
            thread::spawn(move || {
                let mut last_tick = Instant::now();
                let mut last_ingest = Instant::now();
                loop {
                    let timeout = tick_rate
                        .checked_sub(last_tick.elapsed())
                        .unwrap_or(tick_rate);

                    let polled = match event::poll(timeout) {
                        Ok(ready) => ready,
                        Err(e) => {
                            error!("Failed to poll terminal events. {e}");
                            break;
                        }
                    };

                    if polled {
                        let sent = match event::read() {
                            Ok(CrosstermEvent::Key(e)) => {
                                if e.kind == KeyEventKind::Press {
                                    sender.send(Event::Key(e))
                                } else {
                                    Ok(())
                                }
                            }
                            Ok(CrosstermEvent::Mouse(e)) => sender.send(Event::Mouse(e)),
                            Ok(CrosstermEvent::Resize(w, h)) => sender.send(Event::Resize(w, h)),
                            Ok(_) => Ok(()),
                            Err(e) => {
                                error!("Failed to read terminal event. {e}");
                                Ok(())
                            }
                        };
                        if sent.is_err() {
                            break;
                        }
                    }

                    if last_tick.elapsed() >= tick_rate {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                        last_tick = Instant::now();
                    }

                    if last_ingest.elapsed() >= ingest_period {
                        if sender.send(Event::Ingest).is_err() {
                            break;
                        }
                        last_ingest = Instant::now();
                    }
                }
            })
        };
        Self {
            sender,
            receiver,
            handler,
        }
    }

    pub fn next(&self) -> AppResult<Event> {
        Ok(self.receiver.recv()?)
    }
}
