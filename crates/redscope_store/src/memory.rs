//! In-memory [`KeyStore`] used by the test suites.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::StoreError;
use crate::types::{KeyValue, ValueKind};
use crate::KeyStore;

/// A fake keyspace. Pattern matching covers the `prefix*` form the watcher
/// actually uses; scans can be made slow or failing to exercise the error
/// and shutdown paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, KeyValue>,
    fail_scans: bool,
    scan_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: KeyValue) {
        self.inner.lock().unwrap().entries.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) {
        self.inner.lock().unwrap().entries.remove(key);
    }

    /// Make every subsequent scan fail until cleared.
    pub fn set_fail_scans(&self, fail: bool) {
        self.inner.lock().unwrap().fail_scans = fail;
    }

    /// Delay every subsequent scan, to park a worker mid-enumeration.
    pub fn set_scan_delay(&self, delay: Option<Duration>) {
        self.inner.lock().unwrap().scan_delay = delay;
    }
}

fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

impl KeyStore for MemoryStore {
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let (delay, fail) = {
            let inner = self.inner.lock().unwrap();
            (inner.scan_delay, inner.fail_scans)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Command(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "simulated scan failure",
            ))));
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .keys()
            .filter(|key| pattern_matches(pattern, key))
            .cloned()
            .collect())
    }

    async fn fetch(&self, key: &str, kind: ValueKind) -> Result<KeyValue, StoreError> {
        let inner = self.inner.lock().unwrap();
        match inner.entries.get(key) {
            None => Err(StoreError::Missing {
                key: key.to_string(),
            }),
            Some(value) if value.kind() != kind => Err(StoreError::WrongKind {
                key: key.to_string(),
                declared: kind,
            }),
            Some(value) => Ok(value.clone()),
        }
    }
}
