//! MemoryPersistence - HashMap-backed persistence for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use event_emitter_rs::EventEmitter;

use super::{ChangeListener, Persistence, PersistenceError};

const CHANGE_EVENT: &str = "persistence:changed";

struct Inner {
    storage: RwLock<HashMap<String, String>>,
    emitter: Mutex<EventEmitter>,
}

/// In-memory persistence backed by a HashMap.
///
/// Clone-friendly via Arc: a clone shares storage and listeners, modeling a
/// second view over the same backing store.
#[derive(Clone)]
pub struct MemoryPersistence {
    inner: Arc<Inner>,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPersistence {
    pub fn new() -> Self {
        MemoryPersistence {
            inner: Arc::new(Inner {
                storage: RwLock::new(HashMap::new()),
                emitter: Mutex::new(EventEmitter::new()),
            }),
        }
    }

    /// Write a value as another view would, then signal registered
    /// listeners. Own `save` calls never signal.
    pub fn notify_external(&self, key: &str, value: &str) {
        if let Ok(mut storage) = self.inner.storage.write() {
            storage.insert(key.to_string(), value.to_string());
        }
        if let Ok(mut emitter) = self.inner.emitter.lock() {
            emitter.emit(CHANGE_EVENT, key.to_string());
        }
    }

    /// Number of stored keys, for tests.
    pub fn len(&self) -> usize {
        self.inner.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Option<String> {
        self.inner
            .storage
            .read()
            .ok()
            .and_then(|storage| storage.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut storage = self
            .inner
            .storage
            .write()
            .map_err(|_| PersistenceError::Storage("lock poisoned".into()))?;
        storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn on_change(&self, listener: ChangeListener) {
        if let Ok(mut emitter) = self.inner.emitter.lock() {
            emitter.on(CHANGE_EVENT, move |key: String| listener(key));
        }
    }
}
