//! Optimistic-update state synchronization for a storefront admin console.
//!
//! [`EntityStore`] owns in-memory collections of products, categories,
//! sub-categories and hero banners plus the trending/best-seller flag sets.
//! Mutations apply locally the moment they are issued, the remote service is
//! called asynchronously, and the store then reconciles the server's
//! authoritative entity in place of the local guess — or rolls the change
//! back and returns the error. Collections are mirrored to a pluggable
//! persistence layer on a debounced write-behind queue and reloaded when
//! another view signals a change.
//!
//! ```ignore
//! use optistore::{CategoryDraft, EntityStore, MemoryPersistence, StoreOptions};
//!
//! let store = Arc::new(EntityStore::new(remote, MemoryPersistence::new(), StoreOptions::default()));
//! Arc::clone(&store).spawn_refresh();
//!
//! let draft = CategoryDraft { name: Some("Wedding Albums".into()), ..Default::default() };
//! let category = store.add_category(&draft).await?;
//! assert!(!category.id.is_pending());
//! ```

mod entity;
mod error;
mod persistence;
mod remote;
mod store;

pub use entity::{
    Category, CategoryDraft, EntityId, HeroBanner, HeroBannerDraft, Product, ProductDraft,
    StoreEntity, SubCategory, SubCategoryDraft,
};
pub use error::StoreError;
pub use persistence::{
    keys, load_or_default, ChangeListener, MemoryPersistence, Persistence, PersistenceError,
    WriteBehind,
};
pub use remote::{ProductFlags, RemoteCollection, RemoteError, RemoteService};
pub use store::{EntityStore, StoreOptions};
