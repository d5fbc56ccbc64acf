use async_trait::async_trait;

use crate::{
    Item, ItemData, ItemId, NewOrder, NewOrderDetail, Order, OrderDetail, OrderDetailId, OrderId,
    Person, PersonData, PersonId, Result,
};

/// Entry point to a relational store.
///
/// Implementations must be cheap to clone; clones share the same
/// underlying storage.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A single unit of work against the store.
///
/// Nothing written through a transaction is visible to other transactions
/// until [`Transaction::commit`] succeeds. Dropping a transaction without
/// committing rolls every write back.
#[async_trait]
pub trait Transaction: Send {
    // -- Persons --

    async fn insert_person(&mut self, data: PersonData) -> Result<Person>;

    async fn find_person(&mut self, id: PersonId) -> Result<Option<Person>>;

    /// Returns all persons ordered by id.
    async fn list_persons(&mut self) -> Result<Vec<Person>>;

    /// Replaces the mutable fields of a person. Returns None if absent.
    async fn update_person(&mut self, id: PersonId, data: PersonData) -> Result<Option<Person>>;

    /// Deletes a person together with their orders and order details.
    async fn delete_person(&mut self, id: PersonId) -> Result<bool>;

    // -- Items --

    async fn insert_item(&mut self, data: ItemData) -> Result<Item>;

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>>;

    /// Reads an item and holds it until the transaction ends, so no other
    /// transaction can attach a detail line to it in the meantime.
    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>>;

    /// Returns all items ordered by id.
    async fn list_items(&mut self) -> Result<Vec<Item>>;

    /// Replaces the mutable fields of an item. Returns None if absent.
    async fn update_item(&mut self, id: ItemId, data: ItemData) -> Result<Option<Item>>;

    /// Deletes an item together with every order detail referencing it.
    ///
    /// Order totals are not touched; callers recompute them.
    async fn delete_item(&mut self, id: ItemId) -> Result<bool>;

    // -- Orders --

    /// Inserts an order header, drawing its number from the order sequence.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Returns all orders, newest first.
    async fn list_orders(&mut self) -> Result<Vec<Order>>;

    /// Returns the orders of one person, newest first.
    async fn list_orders_for_person(&mut self, person_id: PersonId) -> Result<Vec<Order>>;

    /// Writes the notes and total of `order` back, provided the stored row
    /// is still at `order.version`.
    ///
    /// Returns the row as stored, with its version incremented, or
    /// `StoreError::ConcurrencyConflict` if the version no longer matches.
    async fn save_order(&mut self, order: &Order) -> Result<Order>;

    /// Deletes an order together with its details.
    async fn delete_order(&mut self, id: OrderId) -> Result<bool>;

    // -- Order details --

    async fn insert_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail>;

    async fn find_detail(&mut self, id: OrderDetailId) -> Result<Option<OrderDetail>>;

    /// Returns the details of an order ordered by id.
    async fn list_details_for_order(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>>;

    /// Returns every detail that references an item.
    async fn list_details_for_item(&mut self, item_id: ItemId) -> Result<Vec<OrderDetail>>;

    /// Writes the quantity and line total of `detail` back. Returns None
    /// if the row no longer exists.
    async fn save_detail(&mut self, detail: &OrderDetail) -> Result<Option<OrderDetail>>;

    async fn delete_detail(&mut self, id: OrderDetailId) -> Result<bool>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self) -> Result<()>;
}
