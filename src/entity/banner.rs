use serde::{Deserialize, Serialize};

use super::{optional, required, EntityId, StoreEntity};
use crate::error::StoreError;

/// A hero banner shown on the storefront landing page.
///
/// `image` is a path or URL; uploading the binary is the caller's concern
/// and happens before the banner is created here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBanner {
    #[serde(flatten)]
    pub id: EntityId,
    pub title: String,
    pub image: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub link: String,
}

impl StoreEntity for HeroBanner {
    const COLLECTION: &'static str = "hero_banners";
    const LOCAL_PREFIX: &'static str = "banner";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut EntityId {
        &mut self.id
    }
}

/// Form input for creating or updating a [`HeroBanner`].
#[derive(Clone, Debug, Default)]
pub struct HeroBannerDraft {
    pub title: Option<String>,
    pub image: Option<String>,
    pub subtitle: Option<String>,
    pub link: Option<String>,
}

impl HeroBannerDraft {
    pub fn normalize(&self) -> Result<HeroBanner, StoreError> {
        Ok(HeroBanner {
            id: EntityId::default(),
            title: required("title", self.title.as_ref())?,
            image: required("image", self.image.as_ref())?,
            subtitle: optional(self.subtitle.as_ref(), ""),
            link: optional(self.link.as_ref(), ""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_requires_title_and_image() {
        let err = HeroBannerDraft {
            image: Some("/img/spring.jpg".to_string()),
            ..HeroBannerDraft::default()
        }
        .normalize()
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "title", .. }));

        let err = HeroBannerDraft {
            title: Some("Spring Sale".to_string()),
            ..HeroBannerDraft::default()
        }
        .normalize()
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "image", .. }));
    }
}
