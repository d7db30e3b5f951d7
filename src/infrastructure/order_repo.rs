use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::RepositoryError;
use crate::domain::order::{ListQuery, ListResult, NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for RepositoryError {
    fn from(e: diesel::result::Error) -> Self {
        RepositoryError::Database(e.to_string())
    }
}

impl From<r2d2::Error> for RepositoryError {
    fn from(e: r2d2::Error) -> Self {
        RepositoryError::Pool(e.to_string())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn to_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
    let status = row
        .status
        .parse::<OrderStatus>()
        .map_err(RepositoryError::InvalidData)?;

    Ok(Order {
        id: row.id,
        total_amount: row.total_amount,
        total_items: row.total_items,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
        items: items
            .into_iter()
            .map(|i| OrderItem {
                id: i.id,
                product_id: i.product_id,
                quantity: i.quantity,
                price: i.price,
            })
            .collect(),
    })
}

fn load_items(conn: &mut PgConnection, order: &OrderRow) -> QueryResult<Vec<OrderItemRow>> {
    OrderItemRow::belonging_to(order)
        .select(OrderItemRow::as_select())
        .order(order_items::position.asc())
        .load(conn)
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs Diesel work on the blocking thread pool with a pooled connection.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RepositoryError::Task(e.to_string()))?
    }
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|conn| {
                // 1. Insert the order header
                let order_id = Uuid::new_v4();
                let row = diesel::insert_into(orders::table)
                    .values(&NewOrderRow {
                        id: order_id,
                        total_amount: order.total_amount,
                        total_items: order.total_items,
                        status: OrderStatus::Pending.as_str().to_string(),
                    })
                    .returning(OrderRow::as_returning())
                    .get_result(conn)?;

                // 2. Insert its items; a failure here rolls back the header too.
                // `position` keeps the requested line order.
                let new_items = order
                    .items
                    .into_iter()
                    .enumerate()
                    .map(|(position, i)| {
                        let position = i32::try_from(position).map_err(|_| {
                            RepositoryError::InvalidData("too many order items".to_string())
                        })?;
                        Ok(NewOrderItemRow {
                            id: Uuid::new_v4(),
                            order_id,
                            position,
                            product_id: i.product_id,
                            quantity: i.quantity,
                            price: i.price,
                        })
                    })
                    .collect::<Result<Vec<_>, RepositoryError>>()?;
                let items = diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .returning(OrderItemRow::as_returning())
                    .get_results(conn)?;

                to_order(row, items)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        self.with_conn(move |conn| {
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            let items = load_items(conn, &row)?;
            to_order(row, items).map(Some)
        })
        .await
    }

    async fn list(&self, query: ListQuery) -> Result<ListResult, RepositoryError> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|conn| {
                let total: i64 = match query.status {
                    Some(status) => orders::table
                        .filter(orders::status.eq(status.as_str()))
                        .count()
                        .get_result(conn)?,
                    None => orders::table.count().get_result(conn)?,
                };

                let mut page = orders::table
                    .select(OrderRow::as_select())
                    .order((orders::created_at.desc(), orders::id.asc()))
                    .limit(query.limit)
                    .offset(query.offset())
                    .into_boxed();
                if let Some(status) = query.status {
                    page = page.filter(orders::status.eq(status.as_str()));
                }
                let rows = page.load(conn)?;

                let items = rows
                    .into_iter()
                    .map(|row| to_order(row, vec![]))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ListResult { items, total })
            })
        })
        .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|conn| {
                let row = diesel::update(orders::table.find(id))
                    .set((
                        orders::status.eq(status.as_str()),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(OrderRow::as_returning())
                    .get_result(conn)
                    .optional()?;

                let Some(row) = row else {
                    return Ok(None);
                };

                let items = load_items(conn, &row)?;
                to_order(row, items).map(Some)
            })
        })
        .await
    }
}
