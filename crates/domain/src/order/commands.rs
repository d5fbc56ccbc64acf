//! Inputs to the order aggregate service.

use store::{ItemId, OrderId, PersonId, Version};

/// One requested line of a new order.
///
/// Carries no price: the unit price is always taken from the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: i32,
}

impl OrderLine {
    pub fn new(item_id: ItemId, quantity: i32) -> Self {
        Self { item_id, quantity }
    }
}

/// Command to create an order with its lines.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The person placing the order.
    pub person_id: PersonId,

    pub notes: Option<String>,

    pub lines: Vec<OrderLine>,
}

impl CreateOrder {
    /// Creates a CreateOrder command without notes.
    pub fn new(person_id: PersonId, lines: Vec<OrderLine>) -> Self {
        Self {
            person_id,
            notes: None,
            lines,
        }
    }

    /// Attaches notes to the order.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Command to append a line to an existing order.
#[derive(Debug, Clone, Copy)]
pub struct AddDetail {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: i32,
}

impl AddDetail {
    pub fn new(order_id: OrderId, item_id: ItemId, quantity: i32) -> Self {
        Self {
            order_id,
            item_id,
            quantity,
        }
    }
}

/// Command to change the metadata of an order.
#[derive(Debug, Clone)]
pub struct UpdateOrder {
    pub order_id: OrderId,

    pub notes: Option<String>,

    /// If set, the update is rejected unless the order is still at this
    /// version.
    pub expected_version: Option<Version>,
}

impl UpdateOrder {
    pub fn new(order_id: OrderId, notes: Option<String>) -> Self {
        Self {
            order_id,
            notes,
            expected_version: None,
        }
    }

    /// Requires the order to be at `version` when the update is applied.
    pub fn expecting(mut self, version: Version) -> Self {
        self.expected_version = Some(version);
        self
    }
}
