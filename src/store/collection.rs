use std::sync::RwLock;

use crate::entity::StoreEntity;

/// One in-memory collection, newest entry first.
///
/// Readers always see the current optimistic state; there is no isolation
/// from in-flight mutations.
pub(crate) struct Collection<E> {
    items: RwLock<Vec<E>>,
}

impl<E: StoreEntity> Collection<E> {
    pub fn new(items: Vec<E>) -> Self {
        Collection {
            items: RwLock::new(items),
        }
    }

    /// Cloned view of the whole collection.
    pub fn snapshot(&self) -> Vec<E> {
        self.items.read().map(|items| items.clone()).unwrap_or_default()
    }

    /// Replace the collection wholesale with an authoritative listing.
    pub fn replace_all(&self, items: Vec<E>) {
        if let Ok(mut guard) = self.items.write() {
            *guard = items;
        }
    }

    /// Insert at the head (newest-first ordering).
    pub fn insert_front(&self, entity: E) {
        if let Ok(mut guard) = self.items.write() {
            guard.insert(0, entity);
        }
    }

    pub fn find(&self, id: &str) -> Option<E> {
        self.items
            .read()
            .ok()
            .and_then(|items| items.iter().find(|e| e.id().matches(id)).cloned())
    }

    /// Swap in `entity` for the entry matching `id`. Returns the previous
    /// entry so callers can keep it for rollback.
    pub fn replace(&self, id: &str, entity: E) -> Option<E> {
        let mut guard = self.items.write().ok()?;
        let position = guard.iter().position(|e| e.id().matches(id))?;
        Some(std::mem::replace(&mut guard[position], entity))
    }

    /// Remove and return the entry matching `id`.
    pub fn remove(&self, id: &str) -> Option<E> {
        let mut guard = self.items.write().ok()?;
        let position = guard.iter().position(|e| e.id().matches(id))?;
        Some(guard.remove(position))
    }

    /// Serialize the current state for the persistence mirror.
    pub fn to_json(&self) -> Option<String> {
        let guard = self.items.read().ok()?;
        match serde_json::to_string(&*guard) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(collection = E::COLLECTION, %err, "mirror serialization failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Category, CategoryDraft, EntityId};

    fn category(name: &str, server_id: &str) -> Category {
        let mut entity = CategoryDraft {
            name: Some(name.to_string()),
            ..CategoryDraft::default()
        }
        .normalize()
        .unwrap();
        entity.id = EntityId::server(server_id);
        entity
    }

    #[test]
    fn insert_front_keeps_newest_first() {
        let collection = Collection::new(vec![category("Frames", "c1")]);
        collection.insert_front(category("Albums", "c2"));

        let snapshot = collection.snapshot();
        assert_eq!(snapshot[0].name, "Albums");
        assert_eq!(snapshot[1].name, "Frames");
    }

    #[test]
    fn find_accepts_either_identifier() {
        let mut pending = CategoryDraft {
            name: Some("Albums".to_string()),
            ..CategoryDraft::default()
        }
        .normalize()
        .unwrap();
        pending.id = EntityId::local("cat");
        let local_id = pending.id.local_id().unwrap().to_string();

        let collection = Collection::new(vec![pending, category("Frames", "c1")]);
        assert_eq!(collection.find(&local_id).unwrap().name, "Albums");
        assert_eq!(collection.find("c1").unwrap().name, "Frames");
        assert!(collection.find("missing").is_none());
    }

    #[test]
    fn replace_returns_previous_entry() {
        let collection = Collection::new(vec![category("Frames", "c1")]);
        let previous = collection.replace("c1", category("Oak Frames", "c1")).unwrap();

        assert_eq!(previous.name, "Frames");
        assert_eq!(collection.find("c1").unwrap().name, "Oak Frames");
    }

    #[test]
    fn remove_returns_entry() {
        let collection = Collection::new(vec![category("Frames", "c1")]);
        assert_eq!(collection.remove("c1").unwrap().name, "Frames");
        assert!(collection.snapshot().is_empty());
        assert!(collection.remove("c1").is_none());
    }
}
