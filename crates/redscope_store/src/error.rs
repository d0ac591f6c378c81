//! Store error taxonomy.

use thiserror::Error;

use crate::types::ValueKind;

/// Errors surfaced by the store collaborator.
///
/// `WrongKind` stays separate from command failures: it flags a scan spec
/// whose declared shape disagrees with what the server actually stores,
/// which is a configuration problem rather than a transport one.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The server could not be reached or rejected the startup handshake.
    #[error("redis connection failed: {0}")]
    Connect(#[source] redis::RedisError),

    /// The key disappeared between the scan and the read.
    #[error("key {key:?} does not exist")]
    Missing { key: String },

    /// The stored value has a different type than the scan spec declares.
    #[error("key {key:?} does not hold a {declared} value")]
    WrongKind { key: String, declared: ValueKind },

    /// Any other command or transport failure.
    #[error(transparent)]
    Command(#[from] redis::RedisError),
}

impl StoreError {
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, StoreError::WrongKind { .. })
    }
}
