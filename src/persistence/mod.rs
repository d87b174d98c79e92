//! Durable, best-effort mirroring of the store's collections.
//!
//! Persistence is a cache/durability collaborator: reads seed the store on
//! startup, writes happen behind a debounce, and nothing here may interrupt
//! the in-memory mutation flow. A corrupt or missing stored value resolves
//! to a caller-supplied default, never an error that escapes the boundary.

mod memory;
mod write_behind;

use std::fmt;

use serde::de::DeserializeOwned;

pub use memory::MemoryPersistence;
pub use write_behind::WriteBehind;

/// Keys the store persists its collections under.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const SUB_CATEGORIES: &str = "sub_categories";
    pub const HERO_BANNERS: &str = "hero_banners";
    pub const TRENDING_IDS: &str = "trending_product_ids";
    pub const BEST_SELLER_IDS: &str = "best_seller_product_ids";
}

/// Listener invoked with the key another view has written.
pub type ChangeListener = Box<dyn Fn(String) + Send + Sync + 'static>;

/// Synchronous key/value persistence, exception-safe at the boundary.
pub trait Persistence: Send + Sync {
    /// Read the raw stored value, `None` if absent.
    fn load(&self, key: &str) -> Option<String>;

    /// Write the raw value. Failures (quota, I/O) are reported but callers
    /// treat them as best-effort and must not let them interrupt mutation.
    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Register a best-effort cross-view change listener. Implementations
    /// only signal writes made by *other* views, never this one's own saves.
    fn on_change(&self, listener: ChangeListener);
}

/// Error from the persistence layer; logged and swallowed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    Storage(String),
    Serialize(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Storage(message) => write!(f, "storage error: {}", message),
            PersistenceError::Serialize(message) => {
                write!(f, "serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Load and parse a stored collection, falling back to `T::default()` on a
/// missing or unparsable value. The parse error never propagates.
pub fn load_or_default<T, P>(persistence: &P, key: &str) -> T
where
    T: DeserializeOwned + Default,
    P: Persistence + ?Sized,
{
    match persistence.load(key) {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "stored value is corrupt, falling back to default");
                T::default()
            }
        },
        None => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_value_falls_back_to_default() {
        let persistence = MemoryPersistence::new();
        persistence.save("products", "{not json").unwrap();

        let loaded: Vec<String> = load_or_default(&persistence, "products");
        assert!(loaded.is_empty());
    }

    #[test]
    fn missing_value_falls_back_to_default() {
        let persistence = MemoryPersistence::new();
        let loaded: Vec<String> = load_or_default(&persistence, "products");
        assert!(loaded.is_empty());
    }

    #[test]
    fn valid_value_round_trips() {
        let persistence = MemoryPersistence::new();
        persistence
            .save("products", r#"["a","b"]"#)
            .unwrap();

        let loaded: Vec<String> = load_or_default(&persistence, "products");
        assert_eq!(loaded, vec!["a".to_string(), "b".to_string()]);
    }
}
