//! Read projections of the order aggregate.
//!
//! Person and item names are resolved when the view is built; they are
//! never stored on the order rows.

use chrono::{DateTime, Utc};
use store::{
    ItemId, Money, Order, OrderDetail, OrderDetailId, OrderId, PersonId, Version,
};

/// An order detail line as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetailView {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    /// None if the item could not be resolved.
    pub item_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Money,
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderDetailView {
    pub fn new(detail: OrderDetail, item_name: Option<String>) -> Self {
        Self {
            id: detail.id,
            order_id: detail.order_id,
            item_id: detail.item_id,
            item_name,
            quantity: detail.quantity,
            unit_price: detail.unit_price,
            line_total: detail.line_total,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
        }
    }
}

/// An order with its detail lines and the owner's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: OrderId,
    pub person_id: PersonId,
    pub person_name: Option<String>,
    pub number: i64,
    pub notes: Option<String>,
    pub total: Money,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub details: Vec<OrderDetailView>,
}

impl OrderView {
    pub fn new(order: Order, person_name: Option<String>, details: Vec<OrderDetailView>) -> Self {
        Self {
            id: order.id,
            person_id: order.person_id,
            person_name,
            number: order.number,
            notes: order.notes,
            total: order.total,
            version: order.version,
            created_at: order.created_at,
            updated_at: order.updated_at,
            details,
        }
    }

    /// Sum of the line totals currently attached to the view, or None if
    /// it overflows.
    pub fn lines_total(&self) -> Option<Money> {
        Money::checked_sum(self.details.iter().map(|d| d.line_total))
    }
}
