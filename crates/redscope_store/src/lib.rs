//! Redis-facing store collaborator for redscope.
//!
//! Everything the watcher needs from the server goes through the narrow
//! [`KeyStore`] trait: a fully-drained cursor scan plus one typed read per
//! value shape. [`StoreClient`] is the production implementation backed by
//! a shared connection manager; [`memory::MemoryStore`] backs the test
//! suites. Nothing in this crate writes to the server.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{RedisConfig, StoreClient};
pub use error::StoreError;
pub use types::{KeyValue, ValueKind};

use std::future::Future;

/// The read-only surface consumed by the scan engine and the detail view.
pub trait KeyStore: Clone + Send + Sync + 'static {
    /// Enumerate every key matching `pattern`, draining the cursor fully
    /// before returning. A partial page is never surfaced.
    fn scan_keys(
        &self,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Read the full value of `key`, decoded according to the declared
    /// `kind`. One bounded round trip, cancellable by the caller's deadline.
    fn fetch(
        &self,
        key: &str,
        kind: ValueKind,
    ) -> impl Future<Output = Result<KeyValue, StoreError>> + Send;
}
