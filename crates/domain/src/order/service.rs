//! Order aggregate service.

use std::collections::HashMap;

use store::{ItemId, Money, NewOrder, Order, OrderDetailId, OrderId, PersonId, Store, Transaction};

use crate::error::{DomainError, EntityKind};

use super::{
    AddDetail, CreateOrder, OrderDetailView, OrderView, UpdateOrder, line_total_overflow,
    order_total_overflow, price_line, recompute_order_total, validate_quantity,
};

/// Service for managing orders and their detail lines.
///
/// Every public method runs in its own store transaction. After any detail
/// mutation the parent order's total is re-derived from all of its lines
/// before the transaction commits, so callers never observe an order whose
/// total disagrees with its details.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an order with its lines.
    ///
    /// Each line is priced from the item's current price. Fails without
    /// writing anything if the person or any item does not exist, or if a
    /// line total or the order total is out of range.
    #[tracing::instrument(
        skip(self, cmd),
        fields(person_id = %cmd.person_id, lines = cmd.lines.len())
    )]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderView, DomainError> {
        for line in &cmd.lines {
            validate_quantity(line.quantity)?;
        }

        let mut tx = self.store.begin().await?;

        let person = tx
            .find_person(cmd.person_id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Person, cmd.person_id))?;

        // Resolve every item before the first write.
        let mut priced = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            let item = tx
                .find_item(line.item_id)
                .await?
                .ok_or_else(|| DomainError::not_found(EntityKind::Item, line.item_id))?;
            priced.push((item, line.quantity));
        }

        let mut line_totals = Vec::with_capacity(priced.len());
        for (item, quantity) in &priced {
            let line_total = item
                .price
                .checked_multiply(*quantity)
                .ok_or_else(|| line_total_overflow(*quantity, item.price))?;
            line_totals.push(line_total);
        }
        let total = Money::checked_sum(line_totals).ok_or_else(order_total_overflow)?;

        let order = tx
            .insert_order(NewOrder {
                person_id: person.id,
                notes: cmd.notes,
                total,
            })
            .await?;

        let mut details = Vec::with_capacity(priced.len());
        for (item, quantity) in priced {
            let detail = tx
                .insert_detail(price_line(order.id, item.id, quantity, item.price)?)
                .await?;
            details.push(OrderDetailView::new(detail, Some(item.name)));
        }

        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            number = order.number,
            total = %order.total,
            "order created"
        );

        Ok(OrderView::new(order, Some(person.display_name()), details))
    }

    /// Appends a line to an order, priced from the item's current price.
    #[tracing::instrument(skip(self))]
    pub async fn add_detail(&self, cmd: AddDetail) -> Result<OrderDetailView, DomainError> {
        validate_quantity(cmd.quantity)?;

        let mut tx = self.store.begin().await?;

        let order = tx
            .find_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Order, cmd.order_id))?;
        let item = tx
            .find_item(cmd.item_id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, cmd.item_id))?;

        let detail = tx
            .insert_detail(price_line(order.id, item.id, cmd.quantity, item.price)?)
            .await?;
        recompute_order_total(&mut tx, order).await?;

        tx.commit().await?;

        metrics::counter!("order_details_mutations_total", "operation" => "add").increment(1);
        Ok(OrderDetailView::new(detail, Some(item.name)))
    }

    /// Changes the quantity of a line.
    ///
    /// The line total is recomputed from the unit price stored on the line,
    /// not from the item's current price.
    #[tracing::instrument(skip(self))]
    pub async fn update_detail_quantity(
        &self,
        detail_id: OrderDetailId,
        quantity: i32,
    ) -> Result<OrderDetailView, DomainError> {
        validate_quantity(quantity)?;

        let mut tx = self.store.begin().await?;

        let detail = tx
            .find_detail(detail_id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::OrderDetail, detail_id))?;
        let order = tx
            .find_order(detail.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Order, detail.order_id))?;

        let unit_price = detail.unit_price;
        let updated = detail
            .with_quantity(quantity)
            .ok_or_else(|| line_total_overflow(quantity, unit_price))?;
        let saved = tx
            .save_detail(&updated)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::OrderDetail, detail_id))?;
        recompute_order_total(&mut tx, order).await?;

        let item_name = tx.find_item(saved.item_id).await?.map(|item| item.name);
        tx.commit().await?;

        metrics::counter!("order_details_mutations_total", "operation" => "update_quantity")
            .increment(1);
        Ok(OrderDetailView::new(saved, item_name))
    }

    /// Removes a line from its order.
    ///
    /// Returns false if the line does not exist, so repeating the call is
    /// harmless.
    #[tracing::instrument(skip(self))]
    pub async fn remove_detail(&self, detail_id: OrderDetailId) -> Result<bool, DomainError> {
        let mut tx = self.store.begin().await?;

        let Some(detail) = tx.find_detail(detail_id).await? else {
            return Ok(false);
        };
        let order = tx.find_order(detail.order_id).await?;

        let removed = tx.delete_detail(detail_id).await?;
        if removed && let Some(order) = order {
            recompute_order_total(&mut tx, order).await?;
        }

        tx.commit().await?;

        if removed {
            metrics::counter!("order_details_mutations_total", "operation" => "remove")
                .increment(1);
        }
        Ok(removed)
    }

    /// Updates the notes of an order. Details and total are untouched.
    ///
    /// Returns None if the order does not exist.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn update_order(&self, cmd: UpdateOrder) -> Result<Option<OrderView>, DomainError> {
        let mut tx = self.store.begin().await?;

        let Some(mut order) = tx.find_order(cmd.order_id).await? else {
            return Ok(None);
        };

        if let Some(expected) = cmd.expected_version
            && expected != order.version
        {
            tracing::warn!(
                order_id = %order.id,
                %expected,
                actual = %order.version,
                "rejecting update of stale order"
            );
            return Err(DomainError::ConcurrencyConflict {
                order_id: order.id,
                expected,
            });
        }

        order.notes = cmd.notes;
        let saved = tx.save_order(&order).await?;
        let view = load_view(&mut tx, saved).await?;

        tx.commit().await?;
        Ok(Some(view))
    }

    /// Deletes an order together with all of its lines.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<bool, DomainError> {
        let mut tx = self.store.begin().await?;
        let deleted = tx.delete_order(order_id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(%order_id, "order deleted");
        }
        Ok(deleted)
    }

    /// Loads an order with its lines. Returns None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderView>, DomainError> {
        let mut tx = self.store.begin().await?;
        match tx.find_order(order_id).await? {
            Some(order) => Ok(Some(load_view(&mut tx, order).await?)),
            None => Ok(None),
        }
    }

    /// Lists all orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.list_orders().await?;
        load_views(&mut tx, orders).await
    }

    /// Lists the orders of one person, newest first.
    ///
    /// An unknown person simply has no orders.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<OrderView>, DomainError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.list_orders_for_person(person_id).await?;
        load_views(&mut tx, orders).await
    }

    /// Lists the lines of an order.
    #[tracing::instrument(skip(self))]
    pub async fn list_details(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderDetailView>, DomainError> {
        let mut tx = self.store.begin().await?;
        if tx.find_order(order_id).await?.is_none() {
            return Err(DomainError::not_found(EntityKind::Order, order_id));
        }

        let details = tx.list_details_for_order(order_id).await?;
        let mut names = HashMap::new();
        let mut views = Vec::with_capacity(details.len());
        for detail in details {
            let name = item_name(&mut tx, &mut names, detail.item_id).await?;
            views.push(OrderDetailView::new(detail, name));
        }
        Ok(views)
    }

    /// Loads a single line. Returns None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_detail(
        &self,
        detail_id: OrderDetailId,
    ) -> Result<Option<OrderDetailView>, DomainError> {
        let mut tx = self.store.begin().await?;
        let Some(detail) = tx.find_detail(detail_id).await? else {
            return Ok(None);
        };
        let name = tx.find_item(detail.item_id).await?.map(|item| item.name);
        Ok(Some(OrderDetailView::new(detail, name)))
    }
}

/// Resolves an item name, remembering earlier lookups.
async fn item_name<T: Transaction>(
    tx: &mut T,
    names: &mut HashMap<ItemId, Option<String>>,
    item_id: ItemId,
) -> Result<Option<String>, DomainError> {
    if let Some(name) = names.get(&item_id) {
        return Ok(name.clone());
    }
    let name = tx.find_item(item_id).await?.map(|item| item.name);
    names.insert(item_id, name.clone());
    Ok(name)
}

async fn load_view<T: Transaction>(tx: &mut T, order: Order) -> Result<OrderView, DomainError> {
    build_view(tx, order, &mut HashMap::new(), &mut HashMap::new()).await
}

async fn load_views<T: Transaction>(
    tx: &mut T,
    orders: Vec<Order>,
) -> Result<Vec<OrderView>, DomainError> {
    let mut person_names = HashMap::new();
    let mut item_names = HashMap::new();
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(build_view(tx, order, &mut person_names, &mut item_names).await?);
    }
    Ok(views)
}

async fn build_view<T: Transaction>(
    tx: &mut T,
    order: Order,
    person_names: &mut HashMap<PersonId, Option<String>>,
    item_names: &mut HashMap<ItemId, Option<String>>,
) -> Result<OrderView, DomainError> {
    let person_name = match person_names.get(&order.person_id) {
        Some(name) => name.clone(),
        None => {
            let name = tx
                .find_person(order.person_id)
                .await?
                .map(|person| person.display_name());
            person_names.insert(order.person_id, name.clone());
            name
        }
    };

    let details = tx.list_details_for_order(order.id).await?;
    let mut detail_views = Vec::with_capacity(details.len());
    for detail in details {
        let name = item_name(tx, item_names, detail.item_id).await?;
        detail_views.push(OrderDetailView::new(detail, name));
    }

    Ok(OrderView::new(order, person_name, detail_views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, ItemData, PersonData};

    use crate::order::OrderLine;

    async fn seed(store: &InMemoryStore, price_cents: i64) -> (PersonId, ItemId) {
        let mut tx = store.begin().await.unwrap();
        let person = tx
            .insert_person(PersonData {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        let item = tx
            .insert_item(ItemData {
                name: "Widget".to_string(),
                description: None,
                price: Money::from_cents(price_cents),
                stock: 100,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (person.id, item.id)
    }

    #[tokio::test]
    async fn test_create_order_prices_from_item() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, 999).await;
        let service = OrderService::new(store);

        let order = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await
            .unwrap();

        assert_eq!(order.total, Money::from_cents(2997));
        assert_eq!(order.details.len(), 1);
        assert_eq!(order.details[0].line_total, Money::from_cents(2997));
        assert_eq!(order.details[0].item_name.as_deref(), Some("Widget"));
        assert_eq!(order.person_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(order.number, 1000);
    }

    #[tokio::test]
    async fn test_create_order_rejects_zero_quantity() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, 999).await;
        let service = OrderService::new(store.clone());

        let result = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 0)]))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_order_rejects_overflowing_line() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, i64::MAX / 2).await;
        let service = OrderService::new(store.clone());

        let result = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_add_detail_recomputes_total() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, 250).await;
        let service = OrderService::new(store);

        let order = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 2)]))
            .await
            .unwrap();
        service
            .add_detail(AddDetail::new(order.id, item_id, 4))
            .await
            .unwrap();

        let order = service.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.details.len(), 2);
        assert_eq!(order.total, Money::from_cents(1500));
        assert_eq!(Some(order.total), order.lines_total());
    }

    #[tokio::test]
    async fn test_remove_detail_is_idempotent() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, 999).await;
        let service = OrderService::new(store);

        let order = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();
        let detail_id = order.details[0].id;

        assert!(service.remove_detail(detail_id).await.unwrap());
        assert!(!service.remove_detail(detail_id).await.unwrap());

        let order = service.get_order(order.id).await.unwrap().unwrap();
        assert!(order.total.is_zero());
    }

    #[tokio::test]
    async fn test_update_order_keeps_total() {
        let store = InMemoryStore::new();
        let (person_id, item_id) = seed(&store, 999).await;
        let service = OrderService::new(store);

        let order = service
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 2)]))
            .await
            .unwrap();

        let updated = service
            .update_order(UpdateOrder::new(order.id, Some("ring twice".to_string())))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.notes.as_deref(), Some("ring twice"));
        assert_eq!(updated.total, order.total);
        assert_eq!(updated.details.len(), 1);
        assert!(updated.version > order.version);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_order_returns_none() {
        let service = OrderService::new(InMemoryStore::new());
        let result = service
            .update_order(UpdateOrder::new(OrderId::new(99), None))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
