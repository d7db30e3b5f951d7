use async_trait::async_trait;
use uuid::Uuid;

use super::errors::{CatalogError, RepositoryError};
use super::order::{ListQuery, ListResult, NewOrder, Order, OrderStatus, ProductSnapshot};

/// Persistence for orders and their items.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Writes the order and all of its items atomically. New orders start as
    /// [`OrderStatus::Pending`].
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    async fn list(&self, query: ListQuery) -> Result<ListResult, RepositoryError>;
    /// Returns `None` when no order has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;
}

/// The remote product catalog, used to substantiate product ids.
#[async_trait]
pub trait ProductCatalog: Send + Sync + 'static {
    /// Fails as a whole; a partial answer is never returned as success.
    async fn validate_products(
        &self,
        ids: &[String],
    ) -> Result<Vec<ProductSnapshot>, CatalogError>;
}
