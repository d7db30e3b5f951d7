use std::collections::{HashMap, HashSet};

use bigdecimal::BigDecimal;
use thiserror::Error;

use super::order::{
    NewOrder, NewOrderItem, Order, OrderDetails, OrderItemDetails, OrderItemInput,
    ProductSnapshot,
};

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("unknown product(s): {}", .0.join(", "))]
    UnknownProducts(Vec<String>),
    #[error("product '{0}' has a negative price")]
    NegativePrice(String),
    #[error("total item count overflows")]
    QuantityOverflow,
}

/// Distinct product ids in first-seen order.
pub fn distinct_product_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn index_snapshots(snapshots: &[ProductSnapshot]) -> HashMap<&str, &ProductSnapshot> {
    snapshots.iter().map(|s| (s.id.as_str(), s)).collect()
}

fn missing_ids<'a, I>(ids: I, index: &HashMap<&str, &ProductSnapshot>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    distinct_product_ids(ids.into_iter().filter(|id| !index.contains_key(*id)))
}

/// Prices every requested line from the catalog snapshots.
///
/// Each line takes the snapshot price of its product; both totals are
/// accumulated in the same pass, so `total_items` is the sum of quantities and
/// `total_amount` the sum of `price * quantity` over every line.
pub fn price_order(
    items: &[OrderItemInput],
    snapshots: &[ProductSnapshot],
) -> Result<NewOrder, PricingError> {
    let index = index_snapshots(snapshots);
    let missing = missing_ids(items.iter().map(|i| i.product_id.as_str()), &index);
    if !missing.is_empty() {
        return Err(PricingError::UnknownProducts(missing));
    }

    let zero = BigDecimal::from(0);
    let mut total_amount = BigDecimal::from(0);
    let mut total_items: i32 = 0;
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let snapshot = index[item.product_id.as_str()];
        if snapshot.price < zero {
            return Err(PricingError::NegativePrice(snapshot.id.clone()));
        }
        total_amount += &snapshot.price * BigDecimal::from(item.quantity);
        total_items = total_items
            .checked_add(item.quantity)
            .ok_or(PricingError::QuantityOverflow)?;
        lines.push(NewOrderItem {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            price: snapshot.price.clone(),
        });
    }

    Ok(NewOrder {
        total_amount,
        total_items,
        items: lines,
    })
}

/// Attaches product names to a stored order. Prices stay those recorded at
/// creation; only the name comes from the snapshots.
pub fn enrich_order(
    order: Order,
    snapshots: &[ProductSnapshot],
) -> Result<OrderDetails, PricingError> {
    let index = index_snapshots(snapshots);
    let missing = missing_ids(order.items.iter().map(|i| i.product_id.as_str()), &index);
    if !missing.is_empty() {
        return Err(PricingError::UnknownProducts(missing));
    }

    let items = order
        .items
        .into_iter()
        .map(|item| OrderItemDetails {
            name: index[item.product_id.as_str()].name.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    Ok(OrderDetails {
        id: order.id,
        total_amount: order.total_amount,
        total_items: order.total_items,
        status: order.status,
        created_at: order.created_at,
        updated_at: order.updated_at,
        items,
    })
}
