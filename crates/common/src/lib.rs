//! Shared types for the order management system.
//!
//! Identifiers are thin wrappers over the integer keys the database assigns,
//! so a `PersonId` can never be passed where an `ItemId` is expected.

mod ids;
mod money;

pub use ids::{ItemId, OrderDetailId, OrderId, PersonId};
pub use money::Money;
