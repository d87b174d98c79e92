use std::collections::HashSet;
use std::sync::RwLock;

/// A feature-flag ID set (trending, best-seller).
///
/// Semantically a derived attribute of each product, tracked as its own
/// collection. The store keeps it and the per-product boolean in agreement
/// on every mutation, including failure-path rollbacks.
pub(crate) struct FlagSet {
    ids: RwLock<HashSet<String>>,
}

impl FlagSet {
    pub fn new(ids: HashSet<String>) -> Self {
        FlagSet {
            ids: RwLock::new(ids),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.read().map(|ids| ids.contains(id)).unwrap_or(false)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.ids.read().map(|ids| ids.clone()).unwrap_or_default()
    }

    /// Set membership for `id` to `member`.
    pub fn set(&self, id: &str, member: bool) {
        if let Ok(mut ids) = self.ids.write() {
            if member {
                ids.insert(id.to_string());
            } else {
                ids.remove(id);
            }
        }
    }

    pub fn remove(&self, id: &str) {
        self.set(id, false);
    }

    pub fn replace_all(&self, new_ids: HashSet<String>) {
        if let Ok(mut ids) = self.ids.write() {
            *ids = new_ids;
        }
    }

    /// Serialize as a sorted JSON array for the persistence mirror.
    pub fn to_json(&self) -> Option<String> {
        let ids = self.snapshot();
        let mut sorted: Vec<String> = ids.into_iter().collect();
        sorted.sort();
        serde_json::to_string(&sorted).ok()
    }
}
