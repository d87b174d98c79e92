use serde::{Deserialize, Serialize};

use super::{optional, required, EntityId, StoreEntity};
use crate::error::StoreError;

/// A top-level product category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(flatten)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl StoreEntity for Category {
    const COLLECTION: &'static str = "categories";
    const LOCAL_PREFIX: &'static str = "cat";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut EntityId {
        &mut self.id
    }
}

/// Form input for creating or updating a [`Category`].
#[derive(Clone, Debug, Default)]
pub struct CategoryDraft {
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl CategoryDraft {
    pub fn normalize(&self) -> Result<Category, StoreError> {
        Ok(Category {
            id: EntityId::default(),
            name: required("name", self.name.as_ref())?,
            image: optional(self.image.as_ref(), ""),
            description: optional(self.description.as_ref(), ""),
        })
    }
}

/// A sub-category nested under a [`Category`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    #[serde(flatten)]
    pub id: EntityId,
    pub name: String,
    /// Parent category reference.
    pub category: String,
    #[serde(default)]
    pub image: String,
}

impl StoreEntity for SubCategory {
    const COLLECTION: &'static str = "sub_categories";
    const LOCAL_PREFIX: &'static str = "subcat";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut EntityId {
        &mut self.id
    }
}

/// Form input for creating or updating a [`SubCategory`].
#[derive(Clone, Debug, Default)]
pub struct SubCategoryDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl SubCategoryDraft {
    pub fn normalize(&self) -> Result<SubCategory, StoreError> {
        Ok(SubCategory {
            id: EntityId::default(),
            name: required("name", self.name.as_ref())?,
            category: optional(self.category.as_ref(), "uncategorized"),
            image: optional(self.image.as_ref(), ""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_requires_name() {
        let err = CategoryDraft::default().normalize().unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "name", .. }));

        let err = CategoryDraft {
            name: Some("   ".to_string()),
            ..CategoryDraft::default()
        }
        .normalize()
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "name", .. }));
    }

    #[test]
    fn sub_category_defaults_parent() {
        let sub = SubCategoryDraft {
            name: Some("Baby Albums".to_string()),
            ..SubCategoryDraft::default()
        }
        .normalize()
        .unwrap();
        assert_eq!(sub.category, "uncategorized");
    }
}
