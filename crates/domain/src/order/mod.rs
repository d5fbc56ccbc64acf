//! Order aggregate: an order header together with its detail lines.

mod commands;
mod service;
mod total;
mod views;

pub use commands::{AddDetail, CreateOrder, OrderLine, UpdateOrder};
pub use service::OrderService;
pub(crate) use total::recompute_order_total;
pub use views::{OrderDetailView, OrderView};

use store::{ItemId, Money, NewOrderDetail, OrderId};

use crate::error::DomainError;

/// Rejects line quantities below one.
pub(crate) fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::InvalidArgument(format!(
            "quantity must be greater than 0, got {quantity}"
        )));
    }
    Ok(())
}

/// Prices a new line from a unit price, rejecting totals that do not fit.
pub(crate) fn price_line(
    order_id: OrderId,
    item_id: ItemId,
    quantity: i32,
    unit_price: Money,
) -> Result<NewOrderDetail, DomainError> {
    NewOrderDetail::new(order_id, item_id, quantity, unit_price)
        .ok_or_else(|| line_total_overflow(quantity, unit_price))
}

pub(crate) fn line_total_overflow(quantity: i32, unit_price: Money) -> DomainError {
    DomainError::InvalidArgument(format!(
        "line total of {quantity} x {unit_price} is out of range"
    ))
}

pub(crate) fn order_total_overflow() -> DomainError {
    DomainError::InvalidArgument("order total is out of range".to_string())
}
