//! Domain layer for the order management system.
//!
//! This crate provides:
//! - the order aggregate service, which keeps every order's stored total
//!   equal to the sum of its detail lines across all mutations
//! - catalog services for persons and items
//! - read projections of orders with resolved person and item names

pub mod catalog;
pub mod error;
pub mod order;

pub use catalog::{ItemService, PersonService};
pub use error::{DomainError, EntityKind};
pub use order::{
    AddDetail, CreateOrder, OrderDetailView, OrderLine, OrderService, OrderView, UpdateOrder,
};
pub use store::{
    Item, ItemData, ItemId, Money, OrderDetailId, OrderId, Person, PersonData, PersonId, Version,
};
