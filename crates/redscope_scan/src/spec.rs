//! Scan spec configuration.

use std::time::Duration;

use serde::Deserialize;

use redscope_store::ValueKind;

fn default_interval_secs() -> u64 {
    10
}

/// One named scan: a key pattern, the declared shape of the values behind
/// it, and how often to re-enumerate. Loaded once from the `[scans.<name>]`
/// config tables and immutable for the life of the process.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSpec {
    pub pattern: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl ScanSpec {
    /// Poll interval, floored at one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
