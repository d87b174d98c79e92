//! Test doubles: a scriptable remote service and entity helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use optistore::{
    Category, EntityId, HeroBanner, Product, ProductFlags, RemoteCollection, RemoteError,
    SubCategory,
};

#[derive(Default)]
struct Inner {
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail: Mutex<HashMap<String, RemoteError>>,
    products: Mutex<Vec<Product>>,
    categories: Mutex<Vec<Category>>,
    sub_categories: Mutex<Vec<SubCategory>>,
    banners: Mutex<Vec<HeroBanner>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

/// Remote service double.
///
/// Calls can be parked on a zero-permit semaphore so a test can observe the
/// store's optimistic state mid-flight, and individual operations can be
/// scripted to fail once by name.
#[derive(Clone, Default)]
pub struct MockRemote {
    inner: Arc<Inner>,
}

impl MockRemote {
    pub fn new() -> Self {
        MockRemote::default()
    }

    /// Park every subsequent call until permits are added to the returned
    /// semaphore (one permit per parked call).
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.inner.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Script the next `op` call (e.g. `"create_categories"`) to fail.
    pub fn fail(&self, op: &str) {
        self.inner.fail.lock().unwrap().insert(
            op.to_string(),
            RemoteError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            },
        );
    }

    /// Stop parking calls.
    pub fn release(&self) {
        *self.inner.gate.lock().unwrap() = None;
    }

    /// Replace the backing product listing returned by `list`.
    pub fn seed_products(&self, products: Vec<Product>) {
        *self.inner.products.lock().unwrap() = products;
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    fn assign_id(&self, prefix: &str) -> EntityId {
        let n = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        EntityId::server(format!("{}{}", prefix, n))
    }

    async fn pass(&self, op: &str) -> Result<(), RemoteError> {
        self.inner.calls.lock().unwrap().push(op.to_string());
        let gate = self.inner.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| RemoteError::Request("gate closed".to_string()))?;
            permit.forget();
        }
        if let Some(err) = self.inner.fail.lock().unwrap().remove(op) {
            return Err(err);
        }
        Ok(())
    }
}

macro_rules! impl_remote_collection {
    ($entity:ty, $field:ident, $prefix:literal, $name:literal) => {
        #[async_trait]
        impl RemoteCollection<$entity> for MockRemote {
            async fn list(&self) -> Result<Vec<$entity>, RemoteError> {
                self.pass(concat!("list_", $name)).await?;
                Ok(self.inner.$field.lock().unwrap().clone())
            }

            async fn create(&self, payload: &$entity) -> Result<$entity, RemoteError> {
                self.pass(concat!("create_", $name)).await?;
                let mut confirmed = payload.clone();
                confirmed.id = self.assign_id($prefix);
                self.inner.$field.lock().unwrap().insert(0, confirmed.clone());
                Ok(confirmed)
            }

            async fn update(&self, id: &str, payload: &$entity) -> Result<$entity, RemoteError> {
                self.pass(concat!("update_", $name)).await?;
                let mut confirmed = payload.clone();
                if confirmed.id.server_id().is_none() {
                    confirmed.id = EntityId::server(id);
                }
                Ok(confirmed)
            }

            async fn delete(&self, id: &str) -> Result<(), RemoteError> {
                self.pass(concat!("delete_", $name)).await?;
                self.inner.$field.lock().unwrap().retain(|e| !e.id.matches(id));
                Ok(())
            }
        }
    };
}

impl_remote_collection!(Product, products, "p", "products");
impl_remote_collection!(Category, categories, "c", "categories");
impl_remote_collection!(SubCategory, sub_categories, "s", "sub_categories");
impl_remote_collection!(HeroBanner, banners, "b", "hero_banners");

#[async_trait]
impl ProductFlags for MockRemote {
    async fn toggle_trending(&self, _id: &str) -> Result<(), RemoteError> {
        self.pass("toggle_trending").await
    }

    async fn toggle_best_seller(&self, _id: &str) -> Result<(), RemoteError> {
        self.pass("toggle_best_seller").await
    }
}

/// A confirmed product with the given flags.
pub fn product(id: &str, name: &str, trending: bool, best_seller: bool) -> Product {
    Product {
        id: EntityId::server(id),
        name: name.to_string(),
        price: 19.99,
        category: "uncategorized".to_string(),
        sub_category: String::new(),
        image: String::new(),
        description: String::new(),
        is_trending: trending,
        is_best_seller: best_seller,
    }
}

/// A confirmed category.
pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: EntityId::server(id),
        name: name.to_string(),
        image: String::new(),
        description: String::new(),
    }
}

/// Let spawned store operations run up to their parked remote call.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
