//! Entity identity and the four storefront entity types.
//!
//! Every entity carries an [`EntityId`] holding at most one of two
//! identifiers: a client-synthesized `localId` that exists only during the
//! optimistic window between creation and server confirmation, and the
//! authoritative `_id` assigned by the backend. Lookups accept either, since
//! callers may still hold the local id while reconciliation is in flight.

mod banner;
mod category;
mod product;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::StoreError;

pub use banner::{HeroBanner, HeroBannerDraft};
pub use category::{Category, CategoryDraft, SubCategory, SubCategoryDraft};
pub use product::{Product, ProductDraft};

/// Dual identifier for an entity.
///
/// An entity with only the local half is pending and must be reconciled or
/// rolled back; once the server half is assigned the local half is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityId {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    server: Option<String>,
    #[serde(rename = "localId", default, skip_serializing_if = "Option::is_none")]
    local: Option<String>,
}

impl EntityId {
    /// Synthesize a fresh pending identifier: `{prefix}_{timestamp}_{random}`.
    ///
    /// The timestamp/random tail keeps local ids unique within a session and
    /// out of the server's identifier space.
    pub fn local(prefix: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let random = Uuid::new_v4().simple().to_string();
        EntityId {
            server: None,
            local: Some(format!("{}_{}_{}", prefix, millis, &random[..8])),
        }
    }

    /// Wrap a server-assigned identifier.
    pub fn server(id: impl Into<String>) -> Self {
        EntityId {
            server: Some(id.into()),
            local: None,
        }
    }

    /// Whether this entity is still in the optimistic window.
    pub fn is_pending(&self) -> bool {
        self.server.is_none()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Whether `candidate` names this entity by either identifier.
    pub fn matches(&self, candidate: &str) -> bool {
        self.server.as_deref() == Some(candidate) || self.local.as_deref() == Some(candidate)
    }

    /// The identifier to hand to the remote service: the server id once
    /// assigned, the local id before that.
    pub fn remote_key(&self) -> &str {
        self.server
            .as_deref()
            .or(self.local.as_deref())
            .unwrap_or("")
    }
}

/// An entity the store can hold in one of its collections.
pub trait StoreEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Persistence key and display name for the collection.
    const COLLECTION: &'static str;

    /// Prefix for synthesized local identifiers, e.g. `cat` for categories.
    const LOCAL_PREFIX: &'static str;

    fn id(&self) -> &EntityId;

    fn id_mut(&mut self) -> &mut EntityId;
}

/// Trim a required draft field, rejecting missing or blank values.
pub(crate) fn required(
    field: &'static str,
    value: Option<&String>,
) -> Result<String, StoreError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(StoreError::Validation {
            field,
            reason: "required".to_string(),
        }),
    }
}

/// Trim an optional draft field, substituting `default` when missing/blank.
pub(crate) fn optional(value: Option<&String>, default: &str) -> String {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Coerce a numeric draft field from its form-input string.
pub(crate) fn numeric(field: &'static str, value: Option<&String>) -> Result<f64, StoreError> {
    let raw = required(field, value)?;
    raw.parse::<f64>().map_err(|_| StoreError::Validation {
        field,
        reason: format!("not a number: {:?}", raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_id_shape() {
        let id = EntityId::local("prod");
        let local = id.local_id().unwrap();
        assert!(local.starts_with("prod_"));
        assert_eq!(local.split('_').count(), 3);
        assert!(id.is_pending());
        assert!(id.server_id().is_none());
    }

    #[test]
    fn local_ids_are_unique() {
        let a = EntityId::local("cat");
        let b = EntityId::local("cat");
        assert_ne!(a.local_id(), b.local_id());
    }

    #[test]
    fn matches_either_identifier() {
        let pending = EntityId::local("cat");
        let local = pending.local_id().unwrap().to_string();
        assert!(pending.matches(&local));
        assert!(!pending.matches("c1"));

        let confirmed = EntityId::server("c1");
        assert!(confirmed.matches("c1"));
        assert!(!confirmed.is_pending());
        assert_eq!(confirmed.remote_key(), "c1");
    }

    #[test]
    fn serde_field_names() {
        let confirmed = EntityId::server("c1");
        let json = serde_json::to_value(&confirmed).unwrap();
        assert_eq!(json["_id"], "c1");
        assert!(json.get("localId").is_none());

        let pending = EntityId::local("cat");
        let json = serde_json::to_value(&pending).unwrap();
        assert!(json.get("_id").is_none());
        assert!(json["localId"].as_str().unwrap().starts_with("cat_"));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(numeric("price", Some(&" 19.99 ".to_string())).unwrap(), 19.99);
        assert!(matches!(
            numeric("price", Some(&"abc".to_string())),
            Err(StoreError::Validation { field: "price", .. })
        ));
        assert!(matches!(
            numeric("price", None),
            Err(StoreError::Validation { field: "price", .. })
        ));
    }
}
