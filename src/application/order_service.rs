use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListQuery, Order, OrderDetails, OrderItemInput, OrderPage, OrderStatus, PageMeta,
};
use crate::domain::ports::{OrderRepository, ProductCatalog};
use crate::domain::pricing::{distinct_product_ids, enrich_order, price_order};

/// Creates and queries orders.
///
/// Holds the storage gateway and the product catalog as collaborators; every
/// failure coming out of them is logged here and re-raised as a
/// [`DomainError`].
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// Validates the products, prices every line, writes the order with its
    /// items in one transaction and returns it with product names attached.
    pub async fn create_order(
        &self,
        items: Vec<OrderItemInput>,
    ) -> Result<OrderDetails, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }
        if let Some(item) = items.iter().find(|i| i.quantity < 1) {
            return Err(DomainError::InvalidInput(format!(
                "quantity for product '{}' must be at least 1",
                item.product_id
            )));
        }

        let product_ids = distinct_product_ids(items.iter().map(|i| i.product_id.as_str()));
        let snapshots = self
            .catalog
            .validate_products(&product_ids)
            .await
            .map_err(|e| {
                log::warn!("Order creation rejected, product validation failed: {}", e);
                DomainError::ValidationFailed(
                    "the product catalog could not validate the requested products".to_string(),
                )
            })?;

        let new_order = price_order(&items, &snapshots).map_err(|e| {
            log::warn!("Order creation rejected: {}", e);
            DomainError::ValidationFailed(e.to_string())
        })?;

        let order = self.repo.create(new_order).await.map_err(|e| {
            log::error!("Order creation failed while persisting: {}", e);
            DomainError::PersistenceFailed("the order could not be saved".to_string())
        })?;

        log::info!(
            "Created order {} ({} item(s), total {})",
            order.id,
            order.total_items,
            order.total_amount
        );

        // The snapshots were used for pricing, so every name is present.
        enrich_order(order, &snapshots).map_err(|e| {
            log::error!("Created order could not be joined with its products: {}", e);
            DomainError::EnrichmentFailed(e.to_string())
        })
    }

    pub async fn list_orders(&self, query: ListQuery) -> Result<OrderPage, DomainError> {
        if query.page < 1 {
            return Err(DomainError::InvalidInput("page must be at least 1".to_string()));
        }
        if query.limit < 1 {
            return Err(DomainError::InvalidInput("limit must be at least 1".to_string()));
        }

        let (page, limit) = (query.page, query.limit);
        let result = self.repo.list(query).await.map_err(|e| {
            log::error!("Listing orders failed: {}", e);
            DomainError::PersistenceFailed("orders could not be listed".to_string())
        })?;

        Ok(OrderPage {
            items: result.items,
            meta: PageMeta::new(result.total, page, limit),
        })
    }

    /// Fetches an order and attaches the current product names. Fails as a
    /// whole if the names cannot be fetched.
    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetails, DomainError> {
        let order = self.find_order(id).await?;

        let product_ids = distinct_product_ids(order.items.iter().map(|i| i.product_id.as_str()));
        let snapshots = if product_ids.is_empty() {
            vec![]
        } else {
            self.catalog
                .validate_products(&product_ids)
                .await
                .map_err(|e| {
                    log::error!("Product names for order {} unavailable: {}", id, e);
                    DomainError::EnrichmentFailed(
                        "product details could not be retrieved".to_string(),
                    )
                })?
        };

        enrich_order(order, &snapshots).map_err(|e| {
            log::error!("Order {} could not be enriched: {}", id, e);
            DomainError::EnrichmentFailed(e.to_string())
        })
    }

    /// Moves an order to `status`. Setting the status it already has is a
    /// no-op and performs no write.
    pub async fn change_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, DomainError> {
        let current = self.find_order(id).await?;
        if current.status == status {
            log::debug!("Order {} already {}, nothing to do", id, status);
            return Ok(current);
        }

        let updated = self
            .repo
            .update_status(id, status)
            .await
            .map_err(|e| {
                log::error!("Status change for order {} failed: {}", id, e);
                DomainError::PersistenceFailed("the order status could not be saved".to_string())
            })?
            .ok_or(DomainError::NotFound(id))?;

        log::info!("Order {} moved from {} to {}", id, current.status, updated.status);
        Ok(updated)
    }

    async fn find_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| {
                log::error!("Loading order {} failed: {}", id, e);
                DomainError::PersistenceFailed("the order could not be loaded".to_string())
            })?
            .ok_or(DomainError::NotFound(id))
    }
}
