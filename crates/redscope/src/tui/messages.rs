//! Bounded history of diagnostic messages.

use chrono::Local;

/// Maximum retained messages.
const LOG_CAPACITY: usize = 100;

/// How many trailing messages the bottom preview pane shows.
pub const PREVIEW_LINES: usize = 3;

/// Bounded, timestamped message history. Oldest entries fall off the front.
///
/// Fed by the engine's fan-in stream (scan errors, enable/disable notices)
/// and by detail-fetch failures; rendered by the Log screen and the preview
/// pane.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamped entry, dropping the oldest past capacity.
    pub fn push(&mut self, message: impl Into<String>) {
        let stamped = format!("{} {}", Local::now().format("%H:%M:%S"), message.into());
        self.entries.push(stamped);
        if self.entries.len() > LOG_CAPACITY {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The trailing preview shown under every screen.
    pub fn preview(&self) -> &[String] {
        let start = self.entries.len().saturating_sub(PREVIEW_LINES);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_drops_the_oldest_entry() {
        let mut log = MessageLog::new();
        for i in 0..LOG_CAPACITY + 5 {
            log.push(format!("message {i}"));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert!(log.entries()[0].ends_with("message 5"));
        assert!(log.entries().last().unwrap().ends_with(&format!(
            "message {}",
            LOG_CAPACITY + 4
        )));
    }

    #[test]
    fn preview_shows_the_tail() {
        let mut log = MessageLog::new();
        log.push("one");
        assert_eq!(log.preview().len(), 1);

        log.push("two");
        log.push("three");
        log.push("four");
        let preview = log.preview();
        assert_eq!(preview.len(), PREVIEW_LINES);
        assert!(preview[0].ends_with("two"));
        assert!(preview[2].ends_with("four"));
    }
}
