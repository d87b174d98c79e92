use std::fmt;

use crate::remote::RemoteError;

/// Error surfaced by [`EntityStore`](crate::EntityStore) operations.
///
/// `Validation`, `NotFound` and `OperationInFlight` are raised before any
/// optimistic state change; `Remote` is raised after the per-operation
/// rollback policy has already restored a consistent in-memory state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input rejected during normalization; no state change occurred.
    Validation {
        field: &'static str,
        reason: String,
    },
    /// No entry matches the given identifier; no state change occurred.
    NotFound {
        collection: &'static str,
        id: String,
    },
    /// Another mutation against the same identifier has not resolved yet.
    OperationInFlight { id: String },
    /// The remote call failed; local state has been rolled back.
    Remote(RemoteError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Validation { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
            StoreError::NotFound { collection, id } => {
                write!(f, "no entry in {} matches {}", collection, id)
            }
            StoreError::OperationInFlight { id } => {
                write!(f, "a mutation for {} is already in flight", id)
            }
            StoreError::Remote(err) => write!(f, "remote call failed: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        StoreError::Remote(err)
    }
}
