//! EntityStore - optimistically updated views of the storefront collections.
//!
//! The store owns the five collections exclusively: Products, Categories,
//! SubCategories, HeroBanners, and the two feature-flag ID sets. Every
//! mutation applies locally first, calls the remote service, then either
//! splices in the server's authoritative entity or rolls the local change
//! back. Reads always see the current optimistic state, including during an
//! in-flight remote call.
//!
//! Construction seeds each collection from persistence synchronously
//! (possibly stale, never failing); [`refresh`](EntityStore::refresh)
//! replaces collections wholesale from the remote in the background. Every
//! change is mirrored back to persistence on a debounced write-behind queue.

mod collection;
mod flags;
mod pending;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::entity::{
    Category, CategoryDraft, EntityId, HeroBanner, HeroBannerDraft, Product, ProductDraft,
    StoreEntity, SubCategory, SubCategoryDraft,
};
use crate::error::StoreError;
use crate::persistence::{keys, load_or_default, Persistence, WriteBehind};
use crate::remote::{ProductFlags, RemoteCollection, RemoteService};

use collection::Collection;
use flags::FlagSet;
use pending::PendingOps;

/// Tuning knobs for a store instance.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Quiet period before a dirty collection is written to persistence.
    pub debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            debounce: Duration::from_millis(300),
        }
    }
}

#[derive(Clone, Copy)]
enum FlagKind {
    Trending,
    BestSeller,
}

/// The optimistic-update state synchronization core.
///
/// Constructed once per session with an injected remote service and
/// persistence, then shared by reference with consumers. All mutation flows
/// through the store; collaborators never write back except as the result of
/// a store-issued call.
pub struct EntityStore<R, P> {
    remote: R,
    persistence: Arc<P>,
    products: Collection<Product>,
    categories: Collection<Category>,
    sub_categories: Collection<SubCategory>,
    banners: Collection<HeroBanner>,
    trending: FlagSet,
    best_sellers: FlagSet,
    pending: PendingOps,
    writer: WriteBehind,
}

impl<R, P> EntityStore<R, P>
where
    R: RemoteService,
    P: Persistence + 'static,
{
    /// Build a store seeded from persistence. Must be called within a tokio
    /// runtime (the write-behind task is spawned here). Corrupt or missing
    /// stored collections seed as empty; seeding never fails.
    pub fn new(remote: R, persistence: P, options: StoreOptions) -> Self {
        let persistence = Arc::new(persistence);
        let writer = WriteBehind::spawn(Arc::clone(&persistence), options.debounce);

        let products = Collection::new(load_or_default(&*persistence, keys::PRODUCTS));
        let categories = Collection::new(load_or_default(&*persistence, keys::CATEGORIES));
        let sub_categories =
            Collection::new(load_or_default(&*persistence, keys::SUB_CATEGORIES));
        let banners = Collection::new(load_or_default(&*persistence, keys::HERO_BANNERS));
        let trending = FlagSet::new(load_id_set(&*persistence, keys::TRENDING_IDS));
        let best_sellers = FlagSet::new(load_id_set(&*persistence, keys::BEST_SELLER_IDS));

        EntityStore {
            remote,
            persistence,
            products,
            categories,
            sub_categories,
            banners,
            trending,
            best_sellers,
            pending: PendingOps::new(),
            writer,
        }
    }

    // ========================================================================
    // Read surface — cloned snapshots of the current optimistic state
    // ========================================================================

    pub fn products(&self) -> Vec<Product> {
        self.products.snapshot()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.snapshot()
    }

    pub fn sub_categories(&self) -> Vec<SubCategory> {
        self.sub_categories.snapshot()
    }

    pub fn banners(&self) -> Vec<HeroBanner> {
        self.banners.snapshot()
    }

    pub fn trending_ids(&self) -> HashSet<String> {
        self.trending.snapshot()
    }

    pub fn best_seller_ids(&self) -> HashSet<String> {
        self.best_sellers.snapshot()
    }

    pub fn is_trending(&self, id: &str) -> bool {
        self.trending.contains(id)
    }

    pub fn is_best_seller(&self, id: &str) -> bool {
        self.best_sellers.contains(id)
    }

    // ========================================================================
    // Hydration
    // ========================================================================

    /// Replace every collection with the remote's authoritative listing.
    ///
    /// Never fails: a collection whose fetch fails keeps its seeded
    /// (possibly stale) value. After a successful product fetch the flag
    /// sets are re-derived from the per-product booleans, but a derived
    /// empty set never overwrites a previously synced selection — a backend
    /// that has not populated flags yet must not wipe it.
    pub async fn refresh(&self) {
        if let Some(products) = self.refetch(&self.products).await {
            self.derive_flags(&products, true);
            self.mirror_flags();
        }
        self.refetch(&self.categories).await;
        self.refetch(&self.sub_categories).await;
        self.refetch(&self.banners).await;
    }

    /// Run [`refresh`](Self::refresh) on a background task so startup never
    /// blocks on the network.
    pub fn spawn_refresh(self: Arc<Self>) -> JoinHandle<()>
    where
        R: 'static,
    {
        tokio::spawn(async move { self.refresh().await })
    }

    /// Reload collections from persistence when another view writes them.
    ///
    /// Best-effort, last-writer-wins: concurrent edits from two views can
    /// overwrite one another. The listener holds only a weak reference, so
    /// a dropped store does not linger.
    pub fn watch(self: Arc<Self>)
    where
        R: 'static,
    {
        let weak = Arc::downgrade(&self);
        self.persistence.on_change(Box::new(move |key| {
            if let Some(store) = weak.upgrade() {
                store.reload(&key);
            }
        }));
    }

    /// Force pending mirror writes out now (deterministic teardown).
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub async fn add_product(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        let entity = draft.normalize()?;
        let product = self.create_in(&self.products, entity).await?;
        self.sync_flags_for(&product);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: &str,
        draft: &ProductDraft,
    ) -> Result<Product, StoreError> {
        let entity = draft.normalize()?;
        let product = self.update_in(&self.products, id, entity).await?;
        self.sync_flags_for(&product);
        Ok(product)
    }

    /// Delete a product, dropping it from both flag sets in the same step.
    /// On remote failure the authoritative collection is re-fetched and the
    /// flag sets re-derived from it (the removed entry's prior shape may be
    /// stale, so it is not re-inserted).
    pub async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let target = self.products.find(id).ok_or_else(|| not_found::<Product>(id))?;
        let _guard = self.pending.begin(&pending_key::<Product>(id), id)?;
        let remote_key = target.id.remote_key().to_string();

        self.products.remove(id);
        self.trending.remove(id);
        self.trending.remove(&remote_key);
        self.best_sellers.remove(id);
        self.best_sellers.remove(&remote_key);
        self.mirror(&self.products);
        self.mirror_flags();

        match RemoteCollection::<Product>::delete(&self.remote, &remote_key).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(fresh) = self.refetch(&self.products).await {
                    self.derive_flags(&fresh, false);
                    self.mirror_flags();
                }
                Err(err.into())
            }
        }
    }

    pub async fn toggle_trending(&self, id: &str) -> Result<bool, StoreError> {
        self.toggle_flag(id, FlagKind::Trending).await
    }

    pub async fn toggle_best_seller(&self, id: &str) -> Result<bool, StoreError> {
        self.toggle_flag(id, FlagKind::BestSeller).await
    }

    // ========================================================================
    // Categories, sub-categories, banners
    // ========================================================================

    pub async fn add_category(&self, draft: &CategoryDraft) -> Result<Category, StoreError> {
        let entity = draft.normalize()?;
        self.create_in(&self.categories, entity).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        draft: &CategoryDraft,
    ) -> Result<Category, StoreError> {
        let entity = draft.normalize()?;
        self.update_in(&self.categories, id, entity).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), StoreError> {
        self.delete_in(&self.categories, id).await
    }

    pub async fn add_sub_category(
        &self,
        draft: &SubCategoryDraft,
    ) -> Result<SubCategory, StoreError> {
        let entity = draft.normalize()?;
        self.create_in(&self.sub_categories, entity).await
    }

    pub async fn update_sub_category(
        &self,
        id: &str,
        draft: &SubCategoryDraft,
    ) -> Result<SubCategory, StoreError> {
        let entity = draft.normalize()?;
        self.update_in(&self.sub_categories, id, entity).await
    }

    pub async fn delete_sub_category(&self, id: &str) -> Result<(), StoreError> {
        self.delete_in(&self.sub_categories, id).await
    }

    pub async fn add_banner(&self, draft: &HeroBannerDraft) -> Result<HeroBanner, StoreError> {
        let entity = draft.normalize()?;
        self.create_in(&self.banners, entity).await
    }

    pub async fn update_banner(
        &self,
        id: &str,
        draft: &HeroBannerDraft,
    ) -> Result<HeroBanner, StoreError> {
        let entity = draft.normalize()?;
        self.update_in(&self.banners, id, entity).await
    }

    pub async fn delete_banner(&self, id: &str) -> Result<(), StoreError> {
        self.delete_in(&self.banners, id).await
    }

    // ========================================================================
    // Shared optimistic machinery
    // ========================================================================

    /// Create: optimistic head insert under a synthesized local id, then
    /// splice in the server entity (which supersedes the local guess
    /// entirely) or remove the optimistic entry on failure.
    async fn create_in<E>(&self, collection: &Collection<E>, mut entity: E) -> Result<E, StoreError>
    where
        E: StoreEntity,
        R: RemoteCollection<E>,
    {
        *entity.id_mut() = EntityId::local(E::LOCAL_PREFIX);
        let local_id = entity.id().local_id().unwrap_or_default().to_string();
        let _guard = self.pending.begin(&pending_key::<E>(&local_id), &local_id)?;

        collection.insert_front(entity.clone());
        self.mirror(collection);

        match RemoteCollection::<E>::create(&self.remote, &entity).await {
            Ok(confirmed) => {
                collection.replace(&local_id, confirmed.clone());
                self.mirror(collection);
                tracing::debug!(
                    collection = E::COLLECTION,
                    local = %local_id,
                    server = confirmed.id().remote_key(),
                    "reconciled optimistic create"
                );
                Ok(confirmed)
            }
            Err(err) => {
                collection.remove(&local_id);
                self.mirror(collection);
                Err(err.into())
            }
        }
    }

    /// Update: full field replacement applied immediately, server entity
    /// spliced in on success, pre-update entry restored on failure.
    async fn update_in<E>(
        &self,
        collection: &Collection<E>,
        id: &str,
        mut entity: E,
    ) -> Result<E, StoreError>
    where
        E: StoreEntity,
        R: RemoteCollection<E>,
    {
        let existing = collection
            .find(id)
            .ok_or_else(|| not_found::<E>(id))?;
        let _guard = self.pending.begin(&pending_key::<E>(id), id)?;

        *entity.id_mut() = existing.id().clone();
        let remote_key = existing.id().remote_key().to_string();
        let previous = collection.replace(id, entity.clone());
        self.mirror(collection);

        match RemoteCollection::<E>::update(&self.remote, &remote_key, &entity).await {
            Ok(confirmed) => {
                collection.replace(id, confirmed.clone());
                self.mirror(collection);
                Ok(confirmed)
            }
            Err(err) => {
                if let Some(previous) = previous {
                    collection.replace(id, previous);
                    self.mirror(collection);
                }
                Err(err.into())
            }
        }
    }

    /// Delete: optimistic removal; on failure the authoritative collection
    /// is re-fetched wholesale rather than re-inserting the removed entry,
    /// whose prior in-memory shape may be stale.
    async fn delete_in<E>(&self, collection: &Collection<E>, id: &str) -> Result<(), StoreError>
    where
        E: StoreEntity,
        R: RemoteCollection<E>,
    {
        let target = collection.find(id).ok_or_else(|| not_found::<E>(id))?;
        let _guard = self.pending.begin(&pending_key::<E>(id), id)?;
        let remote_key = target.id().remote_key().to_string();

        collection.remove(id);
        self.mirror(collection);

        match RemoteCollection::<E>::delete(&self.remote, &remote_key).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.refetch(collection).await;
                Err(err.into())
            }
        }
    }

    async fn toggle_flag(&self, id: &str, kind: FlagKind) -> Result<bool, StoreError> {
        let product = self.products.find(id).ok_or_else(|| not_found::<Product>(id))?;
        let _guard = self.pending.begin(&pending_key::<Product>(id), id)?;

        // Single source of truth for rollback: the pre-toggle set
        // membership, captured once.
        let was = self.flag_set(kind).contains(id);
        self.apply_flag(id, kind, !was);

        let remote_key = product.id.remote_key().to_string();
        let result = match kind {
            FlagKind::Trending => self.remote.toggle_trending(&remote_key).await,
            FlagKind::BestSeller => self.remote.toggle_best_seller(&remote_key).await,
        };

        match result {
            Ok(()) => Ok(!was),
            Err(err) => {
                self.apply_flag(id, kind, was);
                Err(err.into())
            }
        }
    }

    fn flag_set(&self, kind: FlagKind) -> &FlagSet {
        match kind {
            FlagKind::Trending => &self.trending,
            FlagKind::BestSeller => &self.best_sellers,
        }
    }

    /// Write one flag value to both representations together; the set and
    /// the product boolean never diverge.
    fn apply_flag(&self, id: &str, kind: FlagKind, value: bool) {
        self.flag_set(kind).set(id, value);
        if let Some(mut product) = self.products.find(id) {
            match kind {
                FlagKind::Trending => product.is_trending = value,
                FlagKind::BestSeller => product.is_best_seller = value,
            }
            self.products.replace(id, product);
        }
        self.mirror(&self.products);
        self.mirror_flags();
    }

    /// Bring both flag sets into agreement with a product's booleans after
    /// a successful create/update.
    fn sync_flags_for(&self, product: &Product) {
        let key = product.id.remote_key();
        self.trending.set(key, product.is_trending);
        self.best_sellers.set(key, product.is_best_seller);
        self.mirror_flags();
    }

    fn derive_flags(&self, products: &[Product], keep_synced_when_empty: bool) {
        let trending: HashSet<String> = products
            .iter()
            .filter(|p| p.is_trending)
            .map(|p| p.id.remote_key().to_string())
            .collect();
        let best_sellers: HashSet<String> = products
            .iter()
            .filter(|p| p.is_best_seller)
            .map(|p| p.id.remote_key().to_string())
            .collect();

        if !keep_synced_when_empty || !trending.is_empty() {
            self.trending.replace_all(trending);
        }
        if !keep_synced_when_empty || !best_sellers.is_empty() {
            self.best_sellers.replace_all(best_sellers);
        }
    }

    /// Fetch the authoritative collection and replace local state wholesale.
    /// On failure the current (seeded or optimistic) value is kept silently.
    async fn refetch<E>(&self, collection: &Collection<E>) -> Option<Vec<E>>
    where
        E: StoreEntity,
        R: RemoteCollection<E>,
    {
        match RemoteCollection::<E>::list(&self.remote).await {
            Ok(fresh) => {
                collection.replace_all(fresh.clone());
                self.mirror(collection);
                Some(fresh)
            }
            Err(err) => {
                tracing::warn!(
                    collection = E::COLLECTION,
                    %err,
                    "authoritative fetch failed, keeping local state"
                );
                None
            }
        }
    }

    fn mirror<E: StoreEntity>(&self, collection: &Collection<E>) {
        if let Some(json) = collection.to_json() {
            self.writer.write(E::COLLECTION, json);
        }
    }

    fn mirror_flags(&self) {
        if let Some(json) = self.trending.to_json() {
            self.writer.write(keys::TRENDING_IDS, json);
        }
        if let Some(json) = self.best_sellers.to_json() {
            self.writer.write(keys::BEST_SELLER_IDS, json);
        }
    }

    fn reload(&self, key: &str) {
        match key {
            keys::PRODUCTS => self.products.replace_all(load_or_default(&*self.persistence, key)),
            keys::CATEGORIES => {
                self.categories.replace_all(load_or_default(&*self.persistence, key))
            }
            keys::SUB_CATEGORIES => {
                self.sub_categories.replace_all(load_or_default(&*self.persistence, key))
            }
            keys::HERO_BANNERS => {
                self.banners.replace_all(load_or_default(&*self.persistence, key))
            }
            keys::TRENDING_IDS => {
                self.trending.replace_all(load_id_set(&*self.persistence, key))
            }
            keys::BEST_SELLER_IDS => {
                self.best_sellers.replace_all(load_id_set(&*self.persistence, key))
            }
            _ => return,
        }
        tracing::debug!(key, "reloaded after cross-view change");
    }
}

fn load_id_set<P: Persistence + ?Sized>(persistence: &P, key: &str) -> HashSet<String> {
    load_or_default::<Vec<String>, P>(persistence, key)
        .into_iter()
        .collect()
}

fn pending_key<E: StoreEntity>(id: &str) -> String {
    format!("{}:{}", E::COLLECTION, id)
}

fn not_found<E: StoreEntity>(id: &str) -> StoreError {
    StoreError::NotFound {
        collection: E::COLLECTION,
        id: id.to_string(),
    }
}
