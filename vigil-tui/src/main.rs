#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io;

use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use vigil_tui::{
    app::{App, AppResult},
    cli,
    config::{Config, INGEST_PERIOD, TICK_RATE},
    event::{Event, EventHandler},
    handler::{handle_key_events, handle_mouse_events},
    ingest::read_events,
    tui::Tui,
};

fn main() -> AppResult<()> {
    env_logger::init();

    let cli_args = cli::cli().get_matches();
    let config = Config::from_matches(&cli_args);

    let stored = match &config.events {
        Some(source) => match read_events(source, &config.query) {
            Ok(events) => events,
            Err(e) => {
                eprintln!("{e:#}");
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    if stored.is_empty() && config.url.is_none() {
        info!("No stored events and no live socket, the chart will stay empty");
    }

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(TICK_RATE, INGEST_PERIOD);

    let mut app = App::new(&config, events.sender.clone());
    app.load(stored);

    let mut tui = Tui::new(terminal, events, app.feed.clone());
    tui.init()?;

    while app.running {
        tui.draw(&mut app)?;
        match tui.events.next()? {
            Event::Tick => app.tick(),
            Event::Ingest => {
                app.ingest();
            }
            Event::Key(key_event) => {
                handle_key_events(key_event, &mut app, tui.events.sender.clone())?
            }
            Event::Mouse(mouse_event) => handle_mouse_events(mouse_event, &mut app),
            Event::Resize(_, _) => {}
            Event::Notification(notification) => app.notify(notification),
        }
    }

    tui.exit()?;
    Ok(())
}
