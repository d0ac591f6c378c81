//! Ownership and aggregation of the full worker set.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use redscope_store::{KeyStore, ValueKind};

use crate::spec::ScanSpec;
use crate::worker::{ScanWorker, WorkerSnapshot};

/// One row of the overview: a worker's identity plus its latest snapshot.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub name: String,
    pub pattern: String,
    pub kind: ValueKind,
    pub key_count: usize,
    pub updated: Option<tokio::time::Instant>,
    pub enabled: bool,
}

/// What drill-down needs from the worker picked by row index.
#[derive(Debug, Clone)]
pub struct WorkerSelection {
    pub name: String,
    pub pattern: String,
    pub kind: ValueKind,
    pub keys: Vec<String>,
}

/// Owns every scan worker plus the fan-in of their error channels.
///
/// Worker order is the lexicographic sort of names, fixed at construction;
/// it is the only mapping from a UI row index to a worker. The worker set
/// itself is immutable, so iteration needs no lock; only each worker's own
/// state is guarded, privately.
pub struct WorkerEngine {
    workers: Vec<Arc<ScanWorker>>,
    messages: mpsc::Receiver<String>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerEngine {
    /// Spawn one scan task and one error fan-in task per configured spec.
    pub fn new<S: KeyStore>(specs: BTreeMap<String, ScanSpec>, store: S) -> Self {
        let cancel = CancellationToken::new();
        let (msg_tx, messages) = mpsc::channel(specs.len().max(1));

        let mut workers = Vec::with_capacity(specs.len());
        let mut tasks = Vec::with_capacity(specs.len() * 2);

        // BTreeMap iteration yields the fixed lexicographic order.
        for (name, spec) in specs {
            let (worker, mut err_rx) = ScanWorker::new(name, spec);

            tasks.push(tokio::spawn(
                worker.clone().run(store.clone(), cancel.clone()),
            ));

            // Fan-in: forward this worker's error slot into the shared
            // stream without ever blocking on a slow consumer.
            let tx = msg_tx.clone();
            let fan_cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = fan_cancel.cancelled() => return,
                        msg = err_rx.recv() => match msg {
                            Some(msg) => {
                                let _ = tx.try_send(msg);
                            }
                            None => return,
                        },
                    }
                }
            }));

            workers.push(worker);
        }

        info!(workers = workers.len(), "scan engine started");
        Self {
            workers,
            messages,
            cancel,
            tasks,
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Snapshot every worker in display order.
    pub fn overview(&self) -> Vec<WorkerSummary> {
        self.workers
            .iter()
            .map(|worker| {
                let WorkerSnapshot {
                    keys,
                    updated,
                    enabled,
                } = worker.snapshot();
                WorkerSummary {
                    name: worker.name().to_string(),
                    pattern: worker.spec().pattern.clone(),
                    kind: worker.spec().kind,
                    key_count: keys.len(),
                    updated,
                    enabled,
                }
            })
            .collect()
    }

    /// The i-th worker's current pattern, keys and declared kind, or `None`
    /// when no such row exists. An empty key list is a valid selection and
    /// is distinct from `None`.
    pub fn select(&self, index: usize) -> Option<WorkerSelection> {
        self.workers.get(index).map(|worker| {
            let snapshot = worker.snapshot();
            WorkerSelection {
                name: worker.name().to_string(),
                pattern: worker.spec().pattern.clone(),
                kind: worker.spec().kind,
                keys: snapshot.keys,
            }
        })
    }

    /// Re-enable the i-th worker, returning its name for the notice.
    pub fn enable(&self, index: usize) -> Option<&str> {
        self.workers.get(index).map(|worker| {
            worker.enable();
            worker.name()
        })
    }

    /// Disable the i-th worker, returning its name for the notice.
    pub fn disable(&self, index: usize) -> Option<&str> {
        self.workers.get(index).map(|worker| {
            worker.disable();
            worker.name()
        })
    }

    /// Drain one pending diagnostic message, if any.
    pub fn try_recv_message(&mut self) -> Option<String> {
        self.messages.try_recv().ok()
    }

    /// Cancel every worker and fan-in task and wait for all of them to
    /// exit. No state write happens after this returns.
    pub async fn close(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
        debug!("scan engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use redscope_store::memory::MemoryStore;
    use redscope_store::KeyValue;

    fn spec(pattern: &str, interval_secs: u64) -> ScanSpec {
        ScanSpec {
            pattern: pattern.to_string(),
            kind: ValueKind::Scalar,
            interval_secs,
        }
    }

    fn engine_with(store: &MemoryStore, entries: &[(&str, &str)]) -> WorkerEngine {
        let mut specs = BTreeMap::new();
        for (name, pattern) in entries {
            specs.insert(name.to_string(), spec(pattern, 1));
        }
        WorkerEngine::new(specs, store.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn workers_are_ordered_by_name() {
        let store = MemoryStore::new();
        let engine = engine_with(&store, &[("zeta", "z:*"), ("alpha", "a:*"), ("mid", "m:*")]);

        let names: Vec<String> = engine.overview().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);

        engine.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn select_distinguishes_not_found_from_empty() {
        let store = MemoryStore::new();
        store.insert("a:1", KeyValue::Scalar("1".into()));
        let engine = engine_with(&store, &[("a", "a:*"), ("b", "b:*")]);

        tokio::time::sleep(Duration::from_millis(10)).await;

        let a = engine.select(0).expect("row 0 exists");
        assert_eq!(a.keys, vec!["a:1"]);

        let b = engine.select(1).expect("row 1 exists");
        assert!(b.keys.is_empty());

        assert!(engine.select(2).is_none());

        engine.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_worker_ages_behind_enabled_one() {
        let store = MemoryStore::new();
        store.insert("a:1", KeyValue::Scalar("1".into()));
        store.insert("b:1", KeyValue::Scalar("1".into()));
        let engine = engine_with(&store, &[("a", "a:*"), ("b", "b:*")]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.disable(0), Some("a"));

        tokio::time::sleep(Duration::from_secs(5)).await;

        let rows = engine.overview();
        let a_updated = rows[0].updated.expect("a scanned once");
        let b_updated = rows[1].updated.expect("b keeps scanning");
        assert!(a_updated < b_updated);
        assert!(!rows[0].enabled);
        assert!(rows[1].enabled);

        engine.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scan_errors_fan_into_one_stream() {
        let store = MemoryStore::new();
        store.set_fail_scans(true);
        let mut engine = engine_with(&store, &[("a", "a:*"), ("b", "b:*")]);

        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut seen = Vec::new();
        while let Some(msg) = engine.try_recv_message() {
            seen.push(msg);
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().any(|m| m.contains("worker a")));
        assert!(seen.iter().any(|m| m.contains("worker b")));

        engine.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn close_joins_a_worker_parked_mid_scan() {
        let store = MemoryStore::new();
        store.set_scan_delay(Some(Duration::from_secs(600)));
        let engine = engine_with(&store, &[("slow", "s:*")]);

        // Let the worker enter its first enumeration and park on the delay.
        tokio::time::sleep(Duration::from_millis(10)).await;

        tokio::time::timeout(Duration::from_secs(1), engine.close())
            .await
            .expect("close returns promptly despite the in-flight scan");
    }

    #[tokio::test(start_paused = true)]
    async fn enable_notice_names_the_worker() {
        let store = MemoryStore::new();
        let engine = engine_with(&store, &[("a", "a:*")]);

        assert_eq!(engine.enable(0), Some("a"));
        assert_eq!(engine.enable(5), None);

        engine.close().await;
    }
}
