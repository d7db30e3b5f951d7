use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

/// A requested line, before the catalog has priced it.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i32,
}

/// Price and name of a product as reported by the catalog at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// A fully priced order ready to be written in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_amount: BigDecimal,
    pub total_items: i32,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub total_amount: BigDecimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An order item joined with the product name fetched from the catalog.
#[derive(Debug, Clone)]
pub struct OrderItemDetails {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub id: Uuid,
    pub total_amount: BigDecimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemDetails>,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub status: Option<OrderStatus>,
}

impl ListQuery {
    /// Rows to skip. Saturates instead of overflowing; a page beyond the last
    /// row is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Rows for one page plus the number of rows matching the filter.
/// Listed orders are loaded without their items.
#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            last_page: if total == 0 { 0 } else { (total - 1) / limit + 1 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub meta: PageMeta,
}
