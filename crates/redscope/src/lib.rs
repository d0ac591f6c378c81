//! redscope: a terminal keyspace watcher for Redis.
//!
//! Named scan specs each enumerate a key pattern on their own schedule in
//! the background; the TUI drills from a live overview of all scans into
//! one scan's matching keys and then into one key's full value.

pub mod config;
pub mod tui;
