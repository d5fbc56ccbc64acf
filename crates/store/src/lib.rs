//! Persistence layer for the order management system.
//!
//! All reads and writes go through a [`Transaction`] obtained from a
//! [`Store`]. A transaction is one unit of work: [`Transaction::commit`]
//! makes its changes visible, dropping it discards them.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;
pub mod version;

pub use common::{ItemId, Money, OrderDetailId, OrderId, PersonId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use records::{
    Item, ItemData, NewOrder, NewOrderDetail, Order, OrderDetail, Person, PersonData,
};
pub use store::{Store, Transaction};
pub use version::Version;
