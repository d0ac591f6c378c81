//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};

/// Application events
#[derive(Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Periodic render tick
    Tick,
    /// Terminal resize
    Resize(u16, u16),
}

/// Polls crossterm for input, falling back to a tick at the render cadence.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Get the next event (blocking up to one tick).
    pub async fn next(&self) -> Event {
        // Crossterm's poll/read block the thread, so keep them off the
        // async runtime.
        let tick_rate = self.tick_rate;

        tokio::task::spawn_blocking(move || {
            if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                    Ok(CrosstermEvent::Resize(width, height)) => Event::Resize(width, height),
                    _ => Event::Tick,
                }
            } else {
                Event::Tick
            }
        })
        .await
        .unwrap_or(Event::Tick)
    }
}
