//! Application state and key handling.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::ListState;
use tracing::warn;

use redscope_scan::{SelectionSet, WorkerEngine, WorkerSummary};
use redscope_store::{KeyStore, KeyValue, ValueKind};

use super::messages::MessageLog;
use super::ui::{self, AgeBands};

/// Upper bound on one detail fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Jump size for PageUp/PageDown.
const PAGE_JUMP: usize = 10;

/// The four screens. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Overview,
    Selection,
    Detail,
    Log,
}

/// Selection cursor for one list screen. The index is clamped against the
/// screen's current row count on every move, so an out-of-range row can
/// never be handed to the renderer.
#[derive(Debug, Default)]
pub struct Cursor {
    pub index: usize,
    pub list: ListState,
}

impl Cursor {
    fn step(&mut self, delta: isize, count: usize) {
        if count == 0 {
            self.clamp(0);
            return;
        }
        let next = (self.index as isize + delta).clamp(0, count as isize - 1);
        self.index = next as usize;
        self.list.select(Some(self.index));
    }

    fn home(&mut self, count: usize) {
        self.index = 0;
        self.clamp(count);
    }

    fn end(&mut self, count: usize) {
        self.index = count.saturating_sub(1);
        self.clamp(count);
    }

    /// Clamp to `[0, count)`; an empty list clears the highlight.
    pub fn clamp(&mut self, count: usize) {
        if count == 0 {
            self.index = 0;
            self.list.select(None);
        } else {
            if self.index >= count {
                self.index = count - 1;
            }
            self.list.select(Some(self.index));
        }
    }
}

/// What the Detail screen shows: the key, its declared kind, and either the
/// fetched payload or the error text that took its place.
#[derive(Debug)]
pub struct DetailView {
    pub key: String,
    pub kind: ValueKind,
    pub result: Result<KeyValue, String>,
}

/// Top-level TUI state: the active screen, per-screen cursors, the scan
/// engine, and the message log.
pub struct App<S: KeyStore> {
    pub running: bool,
    pub screen: Screen,
    /// Where Esc returns to from the Log screen.
    prev_screen: Screen,

    engine: WorkerEngine,
    store: S,

    /// Snapshot the overview renders from, refreshed on every tick.
    pub overview_rows: Vec<WorkerSummary>,
    pub overview_cursor: Cursor,

    pub selection: Option<SelectionSet>,
    pub selection_cursor: Cursor,

    pub detail: Option<DetailView>,
    pub detail_scroll: usize,

    pub log_scroll: usize,

    pub messages: MessageLog,
    pub age_bands: AgeBands,
}

impl<S: KeyStore> App<S> {
    pub fn new(engine: WorkerEngine, store: S) -> Self {
        let mut app = Self {
            running: true,
            screen: Screen::Overview,
            prev_screen: Screen::Overview,
            engine,
            store,
            overview_rows: Vec::new(),
            overview_cursor: Cursor::default(),
            selection: None,
            selection_cursor: Cursor::default(),
            detail: None,
            detail_scroll: 0,
            log_scroll: 0,
            messages: MessageLog::new(),
            age_bands: AgeBands::default(),
        };
        app.refresh_overview();
        app
    }

    /// Periodic poll: drain engine diagnostics, re-snapshot the overview.
    pub fn tick(&mut self) {
        while let Some(message) = self.engine.try_recv_message() {
            self.messages.push(message);
        }
        self.refresh_overview();
    }

    fn refresh_overview(&mut self) {
        self.overview_rows = self.engine.overview();
        self.overview_cursor.clamp(self.overview_rows.len());
    }

    /// Stop every background task before the process exits.
    pub async fn shutdown(self) {
        self.engine.close().await;
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Global bindings work on every screen.
        match key.code {
            KeyCode::Char('q') => {
                self.running = false;
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
                return;
            }
            _ => {}
        }

        match self.screen {
            Screen::Overview => self.handle_overview_key(key),
            Screen::Selection => self.handle_selection_key(key).await,
            Screen::Detail => self.handle_detail_key(key),
            Screen::Log => self.handle_log_key(key),
        }
    }

    fn open_log(&mut self) {
        self.prev_screen = self.screen;
        self.log_scroll = 0;
        self.screen = Screen::Log;
    }

    fn handle_overview_key(&mut self, key: KeyEvent) {
        let count = self.overview_rows.len();
        match key.code {
            KeyCode::Up => self.overview_cursor.step(-1, count),
            KeyCode::Down => self.overview_cursor.step(1, count),
            KeyCode::PageUp => self.overview_cursor.step(-(PAGE_JUMP as isize), count),
            KeyCode::PageDown => self.overview_cursor.step(PAGE_JUMP as isize, count),
            KeyCode::Home => self.overview_cursor.home(count),
            KeyCode::End => self.overview_cursor.end(count),
            KeyCode::Enter => self.open_selection(),
            KeyCode::Char('e') => {
                if let Some(name) = self.engine.enable(self.overview_cursor.index) {
                    let notice = format!("enabled worker {name:?}");
                    self.messages.push(notice);
                }
            }
            KeyCode::Char('d') => {
                if let Some(name) = self.engine.disable(self.overview_cursor.index) {
                    let notice = format!("disabled worker {name:?}");
                    self.messages.push(notice);
                }
            }
            KeyCode::Char('m') => self.open_log(),
            _ => {}
        }
    }

    /// Drill into the selected worker's current matches. An empty match set
    /// stays on the overview with a notice instead of opening an empty
    /// screen.
    fn open_selection(&mut self) {
        let Some(picked) = self.engine.select(self.overview_cursor.index) else {
            return;
        };
        if picked.keys.is_empty() {
            self.messages
                .push(format!("worker {:?}: no matching keys", picked.name));
            return;
        }

        let set = SelectionSet::new(picked.keys, picked.kind);
        self.selection_cursor = Cursor::default();
        self.selection_cursor.clamp(set.len());
        self.selection = Some(set);
        self.screen = Screen::Selection;
    }

    async fn handle_selection_key(&mut self, key: KeyEvent) {
        let count = self.selection.as_ref().map_or(0, SelectionSet::len);
        match key.code {
            KeyCode::Up => self.selection_cursor.step(-1, count),
            KeyCode::Down => self.selection_cursor.step(1, count),
            KeyCode::PageUp => self.selection_cursor.step(-(PAGE_JUMP as isize), count),
            KeyCode::PageDown => self.selection_cursor.step(PAGE_JUMP as isize, count),
            KeyCode::Home => self.selection_cursor.home(count),
            KeyCode::End => self.selection_cursor.end(count),
            KeyCode::Enter => self.open_detail().await,
            KeyCode::Esc => {
                self.selection = None;
                self.screen = Screen::Overview;
            }
            KeyCode::Char('m') => self.open_log(),
            _ => {}
        }
    }

    /// Fetch the selected key under a fixed timeout and enter Detail either
    /// way; a failed or timed-out read shows as an error payload instead of
    /// blocking navigation.
    async fn open_detail(&mut self) {
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        let Some(key) = selection.get(self.selection_cursor.index) else {
            return;
        };
        let key = key.to_string();
        let kind = selection.kind();

        let result = match tokio::time::timeout(FETCH_TIMEOUT, self.store.fetch(&key, kind)).await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(key = %key, %err, "detail fetch failed");
                if err.is_shape_mismatch() {
                    self.messages.push(format!("shape mismatch: {err}"));
                } else {
                    self.messages.push(format!("fetch failed: {err}"));
                }
                Err(err.to_string())
            }
            Err(_) => {
                warn!(key = %key, "detail fetch timed out");
                let text = format!(
                    "fetch timed out for {key:?} after {}s",
                    FETCH_TIMEOUT.as_secs()
                );
                self.messages.push(text.clone());
                Err(text)
            }
        };

        self.detail = Some(DetailView { key, kind, result });
        self.detail_scroll = 0;
        self.screen = Screen::Detail;
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let rows = self
            .detail
            .as_ref()
            .map_or(0, |detail| ui::detail_rows(detail).len());
        match key.code {
            KeyCode::Up => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            KeyCode::Down => {
                self.detail_scroll = (self.detail_scroll + 1).min(rows.saturating_sub(1));
            }
            KeyCode::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(PAGE_JUMP),
            KeyCode::PageDown => {
                self.detail_scroll = (self.detail_scroll + PAGE_JUMP).min(rows.saturating_sub(1));
            }
            KeyCode::Home => self.detail_scroll = 0,
            KeyCode::End => self.detail_scroll = rows.saturating_sub(1),
            KeyCode::Esc => {
                self.detail = None;
                self.screen = Screen::Selection;
            }
            KeyCode::Char('m') => self.open_log(),
            _ => {}
        }
    }

    fn handle_log_key(&mut self, key: KeyEvent) {
        let rows = self.messages.len();
        match key.code {
            KeyCode::Up => self.log_scroll = self.log_scroll.saturating_sub(1),
            KeyCode::Down => self.log_scroll = (self.log_scroll + 1).min(rows.saturating_sub(1)),
            KeyCode::PageUp => self.log_scroll = self.log_scroll.saturating_sub(PAGE_JUMP),
            KeyCode::PageDown => {
                self.log_scroll = (self.log_scroll + PAGE_JUMP).min(rows.saturating_sub(1));
            }
            KeyCode::Home => self.log_scroll = 0,
            KeyCode::End => self.log_scroll = rows.saturating_sub(1),
            KeyCode::Esc => self.screen = self.prev_screen,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use redscope_scan::ScanSpec;
    use redscope_store::memory::MemoryStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(store: &MemoryStore, entries: &[(&str, &str, ValueKind)]) -> App<MemoryStore> {
        let mut specs = BTreeMap::new();
        for (name, pattern, kind) in entries {
            specs.insert(
                name.to_string(),
                ScanSpec {
                    pattern: pattern.to_string(),
                    kind: *kind,
                    interval_secs: 1,
                },
            );
        }
        let engine = WorkerEngine::new(specs, store.clone());
        App::new(engine, store.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn empty_match_set_stays_on_overview_with_notice() {
        let store = MemoryStore::new();
        let mut app = app_with(&store, &[("ghosts", "ghost:*", ValueKind::Scalar)]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        app.tick();

        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.screen, Screen::Overview);
        assert!(app.selection.is_none());
        assert!(app
            .messages
            .entries()
            .iter()
            .any(|m| m.contains("no matching keys")));

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn log_screen_returns_to_where_it_was_opened() {
        let store = MemoryStore::new();
        store.insert("a:1", KeyValue::Scalar("1".into()));
        let mut app = app_with(&store, &[("a", "a:*", ValueKind::Scalar)]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        app.tick();

        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.screen, Screen::Selection);

        app.handle_key(key(KeyCode::Char('m'))).await;
        assert_eq!(app.screen, Screen::Log);

        app.handle_key(key(KeyCode::Esc)).await;
        assert_eq!(app.screen, Screen::Selection);

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn enable_and_disable_emit_notices() {
        let store = MemoryStore::new();
        let mut app = app_with(&store, &[("a", "a:*", ValueKind::Scalar)]);

        app.handle_key(key(KeyCode::Char('d'))).await;
        app.handle_key(key(KeyCode::Char('e'))).await;

        let entries = app.messages.entries();
        assert!(entries.iter().any(|m| m.contains("disabled worker \"a\"")));
        assert!(entries.iter().any(|m| m.contains("enabled worker \"a\"")));

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_clamps_at_both_ends() {
        let store = MemoryStore::new();
        let mut app = app_with(
            &store,
            &[
                ("a", "a:*", ValueKind::Scalar),
                ("b", "b:*", ValueKind::Scalar),
            ],
        );

        app.handle_key(key(KeyCode::Up)).await;
        assert_eq!(app.overview_cursor.index, 0);

        app.handle_key(key(KeyCode::PageDown)).await;
        assert_eq!(app.overview_cursor.index, 1);

        app.handle_key(key(KeyCode::End)).await;
        assert_eq!(app.overview_cursor.index, 1);

        app.handle_key(key(KeyCode::Home)).await;
        assert_eq!(app.overview_cursor.index, 0);

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shape_mismatch_is_logged_distinctly() {
        let store = MemoryStore::new();
        store.insert("user:1", KeyValue::Scalar("not-a-hash".into()));
        let mut app = app_with(&store, &[("users", "user:*", ValueKind::Hash)]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        app.tick();

        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.screen, Screen::Selection);

        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.screen, Screen::Detail);

        let detail = app.detail.as_ref().expect("detail is entered on failure");
        assert!(detail.result.is_err());
        assert!(app
            .messages
            .entries()
            .iter()
            .any(|m| m.contains("shape mismatch")));

        app.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn selection_is_a_frozen_snapshot() {
        let store = MemoryStore::new();
        store.insert("a:1", KeyValue::Scalar("1".into()));
        let mut app = app_with(&store, &[("a", "a:*", ValueKind::Scalar)]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        app.tick();
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.screen, Screen::Selection);

        // The worker picks up a new key; the open selection must not.
        store.insert("a:2", KeyValue::Scalar("2".into()));
        tokio::time::sleep(Duration::from_secs(2)).await;
        app.tick();

        let selection = app.selection.as_ref().unwrap();
        assert_eq!(selection.keys(), ["a:1"]);

        // Re-entering from the overview sees the fresh snapshot.
        app.handle_key(key(KeyCode::Esc)).await;
        app.handle_key(key(KeyCode::Enter)).await;
        let selection = app.selection.as_ref().unwrap();
        assert_eq!(selection.keys(), ["a:1", "a:2"]);

        app.shutdown().await;
    }
}
