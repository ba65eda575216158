use std::{
    io::ErrorKind,
    mem,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use log::{debug, error, info, warn};
use tungstenite::{Message, stream::MaybeTlsStream};
use vigil_common::{EventRecord, decode_live_message};

use crate::{
    config::SOCKET_POLL_INTERVAL,
    event::Event,
    notification::{Notification, NotificationLevel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Buffered,
    Dropped,
    Discarded,
}

#[derive(Debug)]
struct Shared {
    state: FeedState,
    buffer: Vec<EventRecord>,
    dropped: u64,
}

/// Receiving end of the firewall's live event socket.
///
/// Arriving messages are only decoded and appended to a pending buffer; the
/// aggregation happens later, when the buffer is drained on an ingest tick.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    shared: Arc<Mutex<Shared>>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: FeedState::Connecting,
                buffer: Vec::new(),
                dropped: 0,
            })),
        }
    }

    /// Connects to `url` on a dedicated thread and starts buffering events.
    pub fn connect(url: String, notification_sender: kanal::Sender<Event>) -> Self {
        let feed = LiveFeed::new();

        thread::spawn({
            let feed = feed.clone();
            move || feed.run(&url, notification_sender)
        });

        feed
    }

    pub fn state(&self) -> FeedState {
        self.shared.lock().unwrap().state
    }

    /// `Connecting -> Open`. Returns false if the feed was closed meanwhile.
    pub fn open(&self) -> bool {
        let mut shared = self.shared.lock().unwrap();
        match shared.state {
            FeedState::Connecting => {
                shared.state = FeedState::Open;
                true
            }
            FeedState::Open => true,
            FeedState::Closed => false,
        }
    }

    /// Terminal. Anything pushed afterwards is discarded.
    /// Also runs from the panic hook, where the lock may be poisoned.
    pub fn close(&self) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.state != FeedState::Closed {
            info!("Live feed closed");
            shared.state = FeedState::Closed;
        }
    }

    pub fn push_message(&self, text: &str) -> PushOutcome {
        let mut shared = self.shared.lock().unwrap();
        if shared.state != FeedState::Open {
            return PushOutcome::Discarded;
        }

        match decode_live_message(text) {
            Ok(record) => {
                shared.buffer.push(record);
                PushOutcome::Buffered
            }
            Err(e) => {
                debug!("Dropping live message: {e}");
                shared.dropped += 1;
                PushOutcome::Dropped
            }
        }
    }

    /// Takes every buffered event, leaving the buffer empty.
    pub fn drain(&self) -> Vec<EventRecord> {
        let mut shared = self.shared.lock().unwrap();
        mem::take(&mut shared.buffer)
    }

    pub fn pending(&self) -> usize {
        self.shared.lock().unwrap().buffer.len()
    }

    pub fn dropped(&self) -> u64 {
        self.shared.lock().unwrap().dropped
    }

    fn run(&self, url: &str, notification_sender: kanal::Sender<Event>) {
        let mut socket = match tungstenite::connect(url) {
            Ok((socket, _)) => socket,
            Err(e) => {
                error!("Failed to connect to {url}. {e}");
                self.close();
                notify(
                    "Failed to connect to the live events socket",
                    NotificationLevel::Error,
                    &notification_sender,
                );
                return;
            }
        };

        // Without a read timeout a quiet socket would never notice `close`.
        if let MaybeTlsStream::Plain(stream) = socket.get_ref()
            && let Err(e) = stream.set_read_timeout(Some(SOCKET_POLL_INTERVAL))
        {
            warn!("Failed to set the socket read timeout. {e}");
        }

        if !self.open() {
            let _ = socket.close(None);
            let _ = socket.flush();
            return;
        }
        info!("Live feed open on {url}");

        loop {
            if self.state() == FeedState::Closed {
                let _ = socket.close(None);
                let _ = socket.flush();
                break;
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    self.push_message(text.as_str());
                }
                Ok(Message::Close(_)) => {
                    self.close();
                    notify(
                        "Live events socket closed by the firewall",
                        NotificationLevel::Warning,
                        &notification_sender,
                    );
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.close();
                    break;
                }
                Err(e) => {
                    error!("Live events socket error. {e}");
                    self.close();
                    notify(
                        "Live events socket error",
                        NotificationLevel::Error,
                        &notification_sender,
                    );
                    break;
                }
            }
        }
    }
}

fn notify(message: &str, level: NotificationLevel, sender: &kanal::Sender<Event>) {
    if let Err(e) = Notification::send(message, level, sender.clone()) {
        error!("Failed to send notification. {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::Category;

    const PASS: &str =
        r#"{"kind":{"event":{"time":"2024-05-01T10:01:00.000001","event":"pass"}}}"#;
    const BLOCKED: &str = r#"{"kind":{"event":{"time":"2024-05-01T10:02:00.5","event":{"blocked":{"rule":[1],"addr":"10.0.0.9:22"}}}}}"#;

    #[test]
    fn state_machine() {
        let feed = LiveFeed::new();
        assert_eq!(feed.state(), FeedState::Connecting);
        assert!(feed.open());
        assert_eq!(feed.state(), FeedState::Open);
        feed.close();
        assert_eq!(feed.state(), FeedState::Closed);
        assert!(!feed.open());
        assert_eq!(feed.state(), FeedState::Closed);
    }

    #[test]
    fn buffers_valid_messages_in_arrival_order() {
        let feed = LiveFeed::new();
        feed.open();

        assert_eq!(feed.push_message(BLOCKED), PushOutcome::Buffered);
        assert_eq!(feed.push_message(PASS), PushOutcome::Buffered);
        assert_eq!(feed.pending(), 2);

        let drained = feed.drain();
        assert_eq!(drained[0].category, Category::Blocked);
        assert_eq!(drained[1].category, Category::Pass);
        assert!(feed.drain().is_empty());
        assert_eq!(feed.pending(), 0);
    }

    #[test]
    fn malformed_messages_are_dropped_without_closing() {
        let feed = LiveFeed::new();
        feed.open();

        assert_eq!(feed.push_message("{"), PushOutcome::Dropped);
        assert_eq!(feed.push_message(r#"{"kind":{}}"#), PushOutcome::Dropped);
        assert_eq!(
            feed.push_message(r#"{"kind":{"event":{"event":"pass"}}}"#),
            PushOutcome::Dropped
        );
        assert_eq!(feed.push_message(PASS), PushOutcome::Buffered);

        assert_eq!(feed.state(), FeedState::Open);
        assert_eq!(feed.dropped(), 3);
        assert_eq!(feed.pending(), 1);
    }

    #[test]
    fn nothing_is_buffered_outside_open() {
        let feed = LiveFeed::new();
        assert_eq!(feed.push_message(PASS), PushOutcome::Discarded);

        feed.open();
        feed.push_message(PASS);
        feed.close();
        assert_eq!(feed.push_message(PASS), PushOutcome::Discarded);
        assert_eq!(feed.drain().len(), 1);
    }

    #[test]
    fn clones_share_the_buffer() {
        let feed = LiveFeed::new();
        let reader = feed.clone();
        feed.open();

        let handle = thread::spawn(move || {
            for _ in 0..100 {
                reader.push_message(PASS);
            }
        });
        handle.join().unwrap();

        assert_eq!(feed.drain().len(), 100);
    }
}
