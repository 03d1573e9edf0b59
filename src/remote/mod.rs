//! Remote collection gateway.
//!
//! Wraps the backend's list/get/create/update/delete endpoints behind one
//! trait with uniform error signalling. Nothing here retries; retry policy
//! belongs to the callers.

pub mod error;
pub mod http;
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::query::QueryState;
use crate::types::{InventoryItem, ItemId, Page};

pub use error::{ApiError, Operation};
pub use http::HttpGateway;
pub use memory::InMemoryGateway;

/// Common interface for inventory backends
pub trait InventoryGateway: Send + Sync + 'static {
    /// Fetch one page of the collection for the given query
    fn list(&self, query: &QueryState) -> impl Future<Output = Result<Page>> + Send;

    /// Fetch a single item by id
    fn get(&self, id: ItemId) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Create an item; the server assigns the id
    fn create(&self, item: &InventoryItem) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Replace the stored item with the given values
    fn update(
        &self,
        id: ItemId,
        item: &InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Delete an item
    fn delete(&self, id: ItemId) -> impl Future<Output = Result<()>> + Send;
}

impl<G: InventoryGateway> InventoryGateway for Arc<G> {
    fn list(&self, query: &QueryState) -> impl Future<Output = Result<Page>> + Send {
        (**self).list(query)
    }

    fn get(&self, id: ItemId) -> impl Future<Output = Result<InventoryItem>> + Send {
        (**self).get(id)
    }

    fn create(&self, item: &InventoryItem) -> impl Future<Output = Result<InventoryItem>> + Send {
        (**self).create(item)
    }

    fn update(
        &self,
        id: ItemId,
        item: &InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem>> + Send {
        (**self).update(id, item)
    }

    fn delete(&self, id: ItemId) -> impl Future<Output = Result<()>> + Send {
        (**self).delete(id)
    }
}
