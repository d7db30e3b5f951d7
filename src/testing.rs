//! In-memory doubles for the service ports, shared by unit tests.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{CatalogError, RepositoryError};
use crate::domain::order::{
    ListQuery, ListResult, NewOrder, Order, OrderItem, OrderStatus, ProductSnapshot,
};
use crate::domain::ports::{OrderRepository, ProductCatalog};

/// Keeps orders in insertion order; lists newest first.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    status_writes: AtomicUsize,
    fail_writes: bool,
}

impl InMemoryOrderRepository {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Database("write refused".to_string()));
        }
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            total_amount: order.total_amount,
            total_items: order.total_items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items: order
                .items
                .into_iter()
                .map(|i| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    quantity: i.quantity,
                    price: i.price,
                })
                .collect(),
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list(&self, query: ListQuery) -> Result<ListResult, RepositoryError> {
        let orders = self.orders.lock().unwrap();
        let matching: Vec<&Order> = orders
            .iter()
            .rev()
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .collect();

        let items = matching
            .iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .map(|o| Order {
                items: vec![],
                ..(*o).clone()
            })
            .collect();

        Ok(ListResult {
            items,
            total: matching.len() as i64,
        })
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Database("write refused".to_string()));
        }
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        let mut orders = self.orders.lock().unwrap();
        Ok(orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status;
            o.updated_at = Utc::now();
            o.clone()
        }))
    }
}

/// Answers from a fixed product list and records every request.
#[derive(Default)]
pub struct StubCatalog {
    products: Vec<ProductSnapshot>,
    requests: Mutex<Vec<Vec<String>>>,
    unavailable: bool,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_product(mut self, id: &str, name: &str, price: &str) -> Self {
        self.products.push(ProductSnapshot {
            id: id.to_string(),
            name: name.to_string(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
        });
        self
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn validate_products(
        &self,
        ids: &[String],
    ) -> Result<Vec<ProductSnapshot>, CatalogError> {
        self.requests.lock().unwrap().push(ids.to_vec());
        if self.unavailable {
            return Err(CatalogError::Transport("connection refused".to_string()));
        }
        // Unknown ids are left out of the answer.
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}
