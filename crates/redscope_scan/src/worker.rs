//! One periodic keyspace enumeration.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use redscope_store::KeyStore;

use crate::spec::ScanSpec;

/// Snapshot of one worker's mutable state, copied out under its lock.
#[derive(Debug, Clone)]
pub struct WorkerSnapshot {
    pub keys: Vec<String>,
    pub updated: Option<Instant>,
    pub enabled: bool,
}

/// Live state owned by one worker. Only the owning scan loop writes the
/// result and timestamp; `enabled` flips from the UI thread under the same
/// lock.
struct WorkerState {
    keys: Vec<String>,
    updated: Option<Instant>,
    enabled: bool,
}

/// A single scan spec's background worker.
///
/// The worker scans once immediately, then once per interval tick while
/// enabled. Failures never clobber the previous result; they go to a
/// single-slot error channel instead, dropped when the slot is occupied.
pub struct ScanWorker {
    name: String,
    spec: ScanSpec,
    state: Mutex<WorkerState>,
    err_tx: mpsc::Sender<String>,
}

impl ScanWorker {
    pub(crate) fn new(name: String, spec: ScanSpec) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (err_tx, err_rx) = mpsc::channel(1);
        let worker = Arc::new(Self {
            name,
            spec,
            state: Mutex::new(WorkerState {
                keys: Vec::new(),
                updated: None,
                enabled: true,
            }),
            err_tx,
        });
        (worker, err_rx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &ScanSpec {
        &self.spec
    }

    /// Copy of {keys, updated, enabled}, taken under the worker's lock.
    pub fn snapshot(&self) -> WorkerSnapshot {
        let state = self.state.lock().unwrap();
        WorkerSnapshot {
            keys: state.keys.clone(),
            updated: state.updated,
            enabled: state.enabled,
        }
    }

    /// Resume scheduling. Missed ticks are not replayed.
    pub fn enable(&self) {
        self.state.lock().unwrap().enabled = true;
    }

    /// Suppress future scheduled scans. An in-flight scan still completes.
    pub fn disable(&self) {
        self.state.lock().unwrap().enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    /// The scan loop. Returns when `cancel` fires, including while an
    /// enumeration is still in flight.
    pub(crate) async fn run<S: KeyStore>(self: Arc<Self>, store: S, cancel: CancellationToken) {
        let mut ticker = time::interval(self.spec.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(worker = %self.name, "scan loop cancelled");
                    return;
                }
                // The first tick completes immediately, which gives the
                // initial scan before the first full interval elapses.
                _ = ticker.tick() => {
                    if self.is_enabled() {
                        self.scan_once(&store, &cancel).await;
                    }
                }
            }
        }
    }

    /// One full enumeration. The stored result is replaced only after the
    /// cursor has been fully drained; failures leave it untouched.
    async fn scan_once<S: KeyStore>(&self, store: &S, cancel: &CancellationToken) {
        let keys = tokio::select! {
            _ = cancel.cancelled() => return,
            result = store.scan_keys(&self.spec.pattern) => match result {
                Ok(keys) => keys,
                Err(err) => {
                    warn!(worker = %self.name, %err, "scan failed");
                    // Single error slot; drop instead of stalling the loop.
                    let _ = self
                        .err_tx
                        .try_send(format!("worker {}: {}", self.name, err));
                    return;
                }
            },
        };

        let mut state = self.state.lock().unwrap();
        state.keys = keys;
        state.updated = Some(Instant::now());
    }
}
