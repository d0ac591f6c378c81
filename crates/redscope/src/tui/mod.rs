//! Terminal User Interface for redscope.
//!
//! Four screens over the scan engine: overview of all scans, the matched
//! keys of one scan, the full value of one key, and the message log.

pub mod app;
pub mod event;
pub mod messages;
pub mod ui;

use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use redscope_scan::WorkerEngine;
use redscope_store::KeyStore;

use self::app::App;
use self::event::{Event, EventHandler};

/// How often the active screen re-renders from current snapshots.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Run the TUI until the operator quits, then stop every background task.
pub async fn run<S: KeyStore>(engine: WorkerEngine, store: S) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine, store);
    let mut events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    // Restore terminal before the (blocking) engine shutdown.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown().await;

    result
}

/// The application loop: draw, then handle one event.
async fn run_app<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    events: &mut EventHandler,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    S: KeyStore,
{
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match events.next().await {
            Event::Key(key) => app.handle_key(key).await,
            Event::Tick => app.tick(),
            Event::Resize(_, _) => {} // Ratatui handles resize
        }
    }

    Ok(())
}
