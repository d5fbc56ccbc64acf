//! Domain error types.

use store::{OrderId, StoreError, Version};
use thiserror::Error;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Item,
    Order,
    OrderDetail,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "Person",
            EntityKind::Item => "Item",
            EntityKind::Order => "Order",
            EntityKind::OrderDetail => "Order detail",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced person, item, order or detail does not exist.
    #[error("{entity} with id {id} not found")]
    ReferenceNotFound { entity: EntityKind, id: i64 },

    /// Input rejected before touching the store.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The order was modified by another writer since it was read.
    #[error("Order {order_id} was modified concurrently (expected version {expected})")]
    ConcurrencyConflict { order_id: OrderId, expected: Version },

    /// An unexpected persistence failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub(crate) fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        DomainError::ReferenceNotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict {
                order_id, expected, ..
            } => DomainError::ConcurrencyConflict { order_id, expected },
            other => DomainError::Store(other),
        }
    }
}
