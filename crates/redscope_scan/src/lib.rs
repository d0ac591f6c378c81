//! The concurrent scanning engine behind redscope.
//!
//! One background task per configured scan spec enumerates its key pattern
//! on its own schedule. The engine owns the full worker set, aggregates
//! their snapshots in a fixed name order, fans worker errors into one
//! bounded stream, and shuts everything down with join-all semantics.

pub mod engine;
pub mod selection;
pub mod spec;
pub mod worker;

pub use engine::{WorkerEngine, WorkerSelection, WorkerSummary};
pub use selection::SelectionSet;
pub use spec::ScanSpec;
pub use worker::WorkerSnapshot;
