use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Item, ItemData, ItemId, NewOrder, NewOrderDetail, Order, OrderDetail, OrderDetailId, OrderId,
    Person, PersonData, PersonId, Result, StoreError,
    store::{Store, Transaction},
    version::Version,
};

/// First number handed out by the order sequence.
pub const FIRST_ORDER_NUMBER: i64 = 1000;

#[derive(Debug, Clone)]
struct MemoryState {
    persons: BTreeMap<PersonId, Person>,
    items: BTreeMap<ItemId, Item>,
    orders: BTreeMap<OrderId, Order>,
    details: BTreeMap<OrderDetailId, OrderDetail>,
    last_person_id: i64,
    last_item_id: i64,
    last_order_id: i64,
    last_detail_id: i64,
    next_order_number: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            persons: BTreeMap::new(),
            items: BTreeMap::new(),
            orders: BTreeMap::new(),
            details: BTreeMap::new(),
            last_person_id: 0,
            last_item_id: 0,
            last_order_id: 0,
            last_detail_id: 0,
            next_order_number: FIRST_ORDER_NUMBER,
        }
    }
}

impl MemoryState {
    fn remove_order_cascade(&mut self, id: OrderId) -> bool {
        if self.orders.remove(&id).is_none() {
            return false;
        }
        self.details.retain(|_, d| d.order_id != id);
        true
    }
}

/// In-memory store implementation for tests and database-less runs.
///
/// Transactions are serialised: [`Store::begin`] takes the write lock and
/// works on a private copy of the state, which replaces the shared state
/// only on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of committed order details.
    pub async fn detail_count(&self) -> usize {
        self.state.read().await.details.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().write_owned().await;
        let working = (*guard).clone();
        Ok(InMemoryTransaction { guard, working })
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    working: MemoryState,
}

fn sorted_newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn insert_person(&mut self, data: PersonData) -> Result<Person> {
        let state = &mut self.working;
        state.last_person_id += 1;
        let person = Person {
            id: PersonId::new(state.last_person_id),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone: data.phone,
            address: data.address,
            created_at: Utc::now(),
            updated_at: None,
        };
        state.persons.insert(person.id, person.clone());
        Ok(person)
    }

    async fn find_person(&mut self, id: PersonId) -> Result<Option<Person>> {
        Ok(self.working.persons.get(&id).cloned())
    }

    async fn list_persons(&mut self) -> Result<Vec<Person>> {
        Ok(self.working.persons.values().cloned().collect())
    }

    async fn update_person(&mut self, id: PersonId, data: PersonData) -> Result<Option<Person>> {
        let Some(person) = self.working.persons.get_mut(&id) else {
            return Ok(None);
        };
        person.first_name = data.first_name;
        person.last_name = data.last_name;
        person.email = data.email;
        person.phone = data.phone;
        person.address = data.address;
        person.updated_at = Some(Utc::now());
        Ok(Some(person.clone()))
    }

    async fn delete_person(&mut self, id: PersonId) -> Result<bool> {
        let state = &mut self.working;
        if state.persons.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<OrderId> = state
            .orders
            .values()
            .filter(|o| o.person_id == id)
            .map(|o| o.id)
            .collect();
        for order_id in owned {
            state.remove_order_cascade(order_id);
        }
        Ok(true)
    }

    async fn insert_item(&mut self, data: ItemData) -> Result<Item> {
        let state = &mut self.working;
        state.last_item_id += 1;
        let item = Item {
            id: ItemId::new(state.last_item_id),
            name: data.name,
            description: data.description,
            price: data.price,
            stock: data.stock,
            created_at: Utc::now(),
            updated_at: None,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.working.items.get(&id).cloned())
    }

    // The write guard already excludes every other transaction.
    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        self.find_item(id).await
    }

    async fn list_items(&mut self) -> Result<Vec<Item>> {
        Ok(self.working.items.values().cloned().collect())
    }

    async fn update_item(&mut self, id: ItemId, data: ItemData) -> Result<Option<Item>> {
        let Some(item) = self.working.items.get_mut(&id) else {
            return Ok(None);
        };
        item.name = data.name;
        item.description = data.description;
        item.price = data.price;
        item.stock = data.stock;
        item.updated_at = Some(Utc::now());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool> {
        let state = &mut self.working;
        if state.items.remove(&id).is_none() {
            return Ok(false);
        }
        state.details.retain(|_, d| d.item_id != id);
        Ok(true)
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let state = &mut self.working;
        state.last_order_id += 1;
        let number = state.next_order_number;
        state.next_order_number += 1;

        let order = Order {
            id: OrderId::new(state.last_order_id),
            person_id: order.person_id,
            number,
            notes: order.notes,
            total: order.total,
            version: Version::first(),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        Ok(sorted_newest_first(
            self.working.orders.values().cloned().collect(),
        ))
    }

    async fn list_orders_for_person(&mut self, person_id: PersonId) -> Result<Vec<Order>> {
        Ok(sorted_newest_first(
            self.working
                .orders
                .values()
                .filter(|o| o.person_id == person_id)
                .cloned()
                .collect(),
        ))
    }

    async fn save_order(&mut self, order: &Order) -> Result<Order> {
        let Some(stored) = self.working.orders.get_mut(&order.id) else {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id,
                expected: order.version,
                actual: None,
            });
        };

        if stored.version != order.version {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id,
                expected: order.version,
                actual: Some(stored.version),
            });
        }

        stored.notes = order.notes.clone();
        stored.total = order.total;
        stored.version = stored.version.next();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        Ok(self.working.remove_order_cascade(id))
    }

    async fn insert_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail> {
        let state = &mut self.working;
        state.last_detail_id += 1;
        let detail = OrderDetail {
            id: OrderDetailId::new(state.last_detail_id),
            order_id: detail.order_id(),
            item_id: detail.item_id(),
            quantity: detail.quantity(),
            unit_price: detail.unit_price(),
            line_total: detail.line_total(),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.details.insert(detail.id, detail.clone());
        Ok(detail)
    }

    async fn find_detail(&mut self, id: OrderDetailId) -> Result<Option<OrderDetail>> {
        Ok(self.working.details.get(&id).cloned())
    }

    async fn list_details_for_order(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        Ok(self
            .working
            .details
            .values()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_details_for_item(&mut self, item_id: ItemId) -> Result<Vec<OrderDetail>> {
        Ok(self
            .working
            .details
            .values()
            .filter(|d| d.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn save_detail(&mut self, detail: &OrderDetail) -> Result<Option<OrderDetail>> {
        let Some(stored) = self.working.details.get_mut(&detail.id) else {
            return Ok(None);
        };
        stored.quantity = detail.quantity;
        stored.line_total = detail.line_total;
        stored.updated_at = Some(Utc::now());
        Ok(Some(stored.clone()))
    }

    async fn delete_detail(&mut self, id: OrderDetailId) -> Result<bool> {
        Ok(self.working.details.remove(&id).is_some())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
