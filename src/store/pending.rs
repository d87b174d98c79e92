use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// In-flight mutation tokens, one per entity identifier.
///
/// A mutation acquires its token before the optimistic apply and holds it
/// across the remote round trip; a second mutation against the same
/// identifier is rejected with [`StoreError::OperationInFlight`] instead of
/// silently interleaving with the first.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingOps {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl PendingOps {
    pub fn new() -> Self {
        PendingOps::default()
    }

    /// Acquire the token for `key`, or reject if one is outstanding.
    pub fn begin(&self, key: &str, id: &str) -> Result<PendingGuard, StoreError> {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !in_flight.insert(key.to_string()) {
            return Err(StoreError::OperationInFlight { id: id.to_string() });
        }
        Ok(PendingGuard {
            ops: self.clone(),
            key: key.to_string(),
        })
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }
}

/// Releases the token when the operation resolves, on every exit path.
#[derive(Debug)]
pub(crate) struct PendingGuard {
    ops: PendingOps,
    key: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut in_flight = match self.ops.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.key);
    }
}
