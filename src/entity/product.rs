use serde::{Deserialize, Serialize};

use super::{numeric, optional, required, EntityId, StoreEntity};
use crate::error::StoreError;

/// A print-goods product (photo book, frame, album).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(flatten)]
    pub id: EntityId,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_best_seller: bool,
}

impl StoreEntity for Product {
    const COLLECTION: &'static str = "products";
    const LOCAL_PREFIX: &'static str = "prod";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut EntityId {
        &mut self.id
    }
}

/// Form input for creating or updating a [`Product`].
///
/// Fields omitted from an update are reset to their defaults, not preserved
/// from the previous record: updates carry the full entity payload.
#[derive(Clone, Debug, Default)]
pub struct ProductDraft {
    pub name: Option<String>,
    /// Raw form value; coerced to a number during normalization.
    pub price: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub is_trending: bool,
    pub is_best_seller: bool,
}

impl ProductDraft {
    /// Validate and normalize into a [`Product`] with an unassigned id.
    pub fn normalize(&self) -> Result<Product, StoreError> {
        Ok(Product {
            id: EntityId::default(),
            name: required("name", self.name.as_ref())?,
            price: numeric("price", self.price.as_ref())?,
            category: optional(self.category.as_ref(), "uncategorized"),
            sub_category: optional(self.sub_category.as_ref(), ""),
            image: optional(self.image.as_ref(), ""),
            description: optional(self.description.as_ref(), ""),
            is_trending: self.is_trending,
            is_best_seller: self.is_best_seller,
        })
    }
}
