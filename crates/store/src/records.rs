//! Row types for the four persisted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemId, Money, OrderDetailId, OrderId, PersonId, Version};

/// A customer who owns orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Person {
    /// Name shown next to the person's orders.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Mutable fields of a person, used for both insert and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A catalog item that can be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    /// Current price. Order details copy it when they are created.
    pub price: Money,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Mutable fields of an item, used for both insert and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i32,
}

/// An order header. Its lines live in [`OrderDetail`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub person_id: PersonId,
    /// Human-facing sequential number, assigned by the store.
    pub number: i64,
    pub notes: Option<String>,
    /// Stored sum of the line totals of all details of this order.
    pub total: Money,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied when inserting an order. The store assigns the id,
/// number, version and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub person_id: PersonId,
    pub notes: Option<String>,
    pub total: Money,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: i32,
    /// Item price at the moment the line was created.
    pub unit_price: Money,
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderDetail {
    /// Returns the line with a new quantity and its line total recomputed
    /// from the stored unit price, or None if that total overflows.
    pub fn with_quantity(mut self, quantity: i32) -> Option<Self> {
        self.line_total = self.unit_price.checked_multiply(quantity)?;
        self.quantity = quantity;
        Some(self)
    }
}

/// Fields supplied when inserting an order detail.
///
/// Only constructible through [`NewOrderDetail::new`], which derives the
/// line total, so a line can never be persisted with an edited total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    order_id: OrderId,
    item_id: ItemId,
    quantity: i32,
    unit_price: Money,
    line_total: Money,
}

impl NewOrderDetail {
    /// Returns None when `quantity * unit_price` does not fit in cents.
    pub fn new(
        order_id: OrderId,
        item_id: ItemId,
        quantity: i32,
        unit_price: Money,
    ) -> Option<Self> {
        Some(Self {
            order_id,
            item_id,
            quantity,
            unit_price,
            line_total: unit_price.checked_multiply(quantity)?,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }
}
