//! The asynchronous boundary to the backend.
//!
//! The store never talks HTTP itself; it calls through [`RemoteService`],
//! which an application implements over its transport of choice. Entities
//! returned by `list`/`create`/`update` carry the authoritative server
//! identifier and fully normalized fields — on reconciliation they entirely
//! supersede the store's local guess.

use std::fmt;

use async_trait::async_trait;

use crate::entity::{Category, HeroBanner, Product, StoreEntity, SubCategory};

/// Failure from the remote service, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (transport failure, offline).
    Request(String),
    /// The backend answered with a non-success status.
    Api { status: u16, message: String },
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Request(message) => write!(f, "request failed: {}", message),
            RemoteError::Api { status, message } => {
                write!(f, "server rejected request ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for RemoteError {}

/// CRUD calls for one entity collection.
#[async_trait]
pub trait RemoteCollection<E: StoreEntity>: Send + Sync {
    /// Fetch the full authoritative collection.
    async fn list(&self) -> Result<Vec<E>, RemoteError>;

    /// Create an entity; the returned entity carries the server id.
    async fn create(&self, payload: &E) -> Result<E, RemoteError>;

    /// Replace an entity's fields; the returned entity is authoritative.
    async fn update(&self, id: &str, payload: &E) -> Result<E, RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Product feature-flag toggles.
#[async_trait]
pub trait ProductFlags: Send + Sync {
    async fn toggle_trending(&self, id: &str) -> Result<(), RemoteError>;

    async fn toggle_best_seller(&self, id: &str) -> Result<(), RemoteError>;
}

/// Full remote surface the store depends on.
pub trait RemoteService:
    RemoteCollection<Product>
    + RemoteCollection<Category>
    + RemoteCollection<SubCategory>
    + RemoteCollection<HeroBanner>
    + ProductFlags
{
}

// Blanket implementation: anything covering all five surfaces is a RemoteService
impl<T> RemoteService for T where
    T: RemoteCollection<Product>
        + RemoteCollection<Category>
        + RemoteCollection<SubCategory>
        + RemoteCollection<HeroBanner>
        + ProductFlags
{
}
