use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::OrderService;
use crate::domain::order::{ListQuery, Order, OrderDetails, OrderItemInput, OrderPage, OrderStatus};
use crate::errors::AppError;

/// Upper bound applied to `limit` on listing requests.
pub const MAX_PAGE_LIMIT: i64 = 100;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    /// Product name from the catalog, present on enriched responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: i32,
    /// Unit price recorded when the order was created, as a decimal string.
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub total_amount: String,
    pub total_items: i32,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(o: OrderDetails) -> Self {
        Self {
            id: o.id,
            total_amount: o.total_amount.to_string(),
            total_items: o.total_items,
            status: o.status,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    name: Some(i.name),
                    quantity: i.quantity,
                    price: i.price.to_string(),
                })
                .collect(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            total_amount: o.total_amount.to_string(),
            total_items: o.total_items,
            status: o.status,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    name: None,
                    quantity: i.quantity,
                    price: i.price.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub total_amount: String,
    pub total_items: i32,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderSummaryResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            total_amount: o.total_amount.to_string(),
            total_items: o.total_items,
            status: o.status,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 10, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only return orders in this status.
    pub status: Option<OrderStatus>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetaResponse {
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderSummaryResponse>,
    pub meta: PageMetaResponse,
}

impl From<OrderPage> for ListOrdersResponse {
    fn from(p: OrderPage) -> Self {
        Self {
            items: p.items.into_iter().map(OrderSummaryResponse::from).collect(),
            meta: PageMetaResponse {
                total: p.meta.total,
                page: p.meta.page,
                last_page: p.meta.last_page,
            },
        }
    }
}

// ── Extractor errors ─────────────────────────────────────────────────────────

/// Bodies that fail to deserialize get the same `{error, message}` body as
/// every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid query parameters: {}", err)).into()
    })
}

/// A path segment that is not a UUID cannot name an order.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::NotFound(format!("Invalid order id: {}", err)).into()
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates every product against the catalog, prices the order from the
/// catalog prices and stores the order with its items in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Invalid request or products could not be validated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let items = body
        .into_inner()
        .items
        .into_iter()
        .map(|i| OrderItemInput {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let order = service.create_order(items).await?;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns a paginated list of orders (without their items), newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("status" = Option<OrderStatus>, Query, description = "Filter by order status"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<OrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = service
        .list_orders(ListQuery {
            page: params.page,
            limit: params.limit.min(MAX_PAGE_LIMIT),
            status: params.status,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::from(page)))
}

/// GET /orders/{id}
///
/// Returns the order with its items and their current product names.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Product details could not be retrieved"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order = service.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /orders/{id}/status
///
/// Moves the order to the requested status. Requesting the current status
/// returns the order unchanged.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = ChangeOrderStatusRequest,
    responses(
        (status = 200, description = "Order after the status change", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn change_order_status(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<ChangeOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order = service
        .change_status(path.into_inner(), body.into_inner().status)
        .await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
