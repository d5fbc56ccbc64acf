//! Integration tests for the order aggregate.
//!
//! These tests exercise the order service together with the catalog
//! services over the in-memory store, checking that totals always match
//! the detail lines and that failed operations leave no trace.

use domain::{
    AddDetail, CreateOrder, DomainError, EntityKind, ItemData, ItemId, ItemService, Money,
    OrderDetailId, OrderId, OrderLine, OrderService, PersonData, PersonId, PersonService,
    UpdateOrder, Version,
};
use store::InMemoryStore;

struct Fixture {
    store: InMemoryStore,
    orders: OrderService<InMemoryStore>,
    persons: PersonService<InMemoryStore>,
    items: ItemService<InMemoryStore>,
}

fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    Fixture {
        orders: OrderService::new(store.clone()),
        persons: PersonService::new(store.clone()),
        items: ItemService::new(store.clone()),
        store,
    }
}

impl Fixture {
    async fn person(&self) -> PersonId {
        self.persons
            .create(PersonData {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                address: Some("12 St James's Square".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    async fn item(&self, name: &str, price_cents: i64) -> ItemId {
        self.items
            .create(ItemData {
                name: name.to_string(),
                description: None,
                price: Money::from_cents(price_cents),
                stock: 50,
            })
            .await
            .unwrap()
            .id
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_update_remove_scenario() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 999).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await
            .unwrap();
        assert_eq!(order.total, Money::from_cents(2997));
        assert_eq!(order.details.len(), 1);
        assert_eq!(order.details[0].line_total, Money::from_cents(2997));

        let detail_id = order.details[0].id;
        let detail = f.orders.update_detail_quantity(detail_id, 5).await.unwrap();
        assert_eq!(detail.line_total, Money::from_cents(4995));
        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total, Money::from_cents(4995));

        assert!(f.orders.remove_detail(detail_id).await.unwrap());
        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total, Money::zero());
        assert!(reloaded.details.is_empty());
        assert!(f.orders.list_details(order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn total_tracks_lines_across_mutations() {
        let f = fixture();
        let person_id = f.person().await;
        let pen = f.item("Pen", 150).await;
        let pad = f.item("Pad", 425).await;

        let order = f
            .orders
            .create_order(
                CreateOrder::new(
                    person_id,
                    vec![OrderLine::new(pen, 2), OrderLine::new(pad, 1)],
                )
                .with_notes("leave at the door"),
            )
            .await
            .unwrap();
        assert_eq!(order.total, Money::from_cents(725));
        assert_eq!(order.notes.as_deref(), Some("leave at the door"));

        let added = f
            .orders
            .add_detail(AddDetail::new(order.id, pad, 3))
            .await
            .unwrap();
        f.orders.update_detail_quantity(order.details[0].id, 4).await.unwrap();
        f.orders.remove_detail(order.details[1].id).await.unwrap();

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.details.len(), 2);
        assert_eq!(Some(reloaded.total), reloaded.lines_total());
        assert_eq!(reloaded.total, Money::from_cents(4 * 150 + 3 * 425));
        assert!(reloaded.details.iter().any(|d| d.id == added.id));
    }

    #[tokio::test]
    async fn order_numbers_start_at_1000_and_increase() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 100).await;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let order = f
                .orders
                .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
                .await
                .unwrap();
            numbers.push(order.number);
        }

        assert_eq!(numbers, vec![1000, 1001, 1002]);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filtered_by_person() {
        let f = fixture();
        let ada = f.person().await;
        let other = f.person().await;
        let item_id = f.item("Widget", 100).await;

        for person_id in [ada, other, ada] {
            f.orders
                .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
                .await
                .unwrap();
        }

        let all = f.orders.list_orders().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at >= all[1].created_at);
        assert!(all[0].id > all[1].id);

        let mine = f.orders.list_orders_for_person(ada).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.person_id == ada));
        assert_eq!(mine[0].person_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(mine[0].details[0].item_name.as_deref(), Some("Widget"));

        let nobody = f
            .orders
            .list_orders_for_person(PersonId::new(999))
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }
}

mod failures_leave_no_trace {
    use super::*;

    #[tokio::test]
    async fn unknown_person_writes_nothing() {
        let f = fixture();
        let item_id = f.item("Widget", 100).await;

        let result = f
            .orders
            .create_order(CreateOrder::new(
                PersonId::new(77),
                vec![OrderLine::new(item_id, 1)],
            ))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound {
                entity: EntityKind::Person,
                id: 77
            })
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_item_among_valid_ones_writes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let a = f.item("A", 100).await;
        let b = f.item("B", 200).await;

        let result = f
            .orders
            .create_order(CreateOrder::new(
                person_id,
                vec![
                    OrderLine::new(a, 1),
                    OrderLine::new(ItemId::new(404), 1),
                    OrderLine::new(b, 2),
                ],
            ))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound {
                entity: EntityKind::Item,
                id: 404
            })
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn non_positive_quantity_changes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 999).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await
            .unwrap();
        let detail_id = order.details[0].id;

        for quantity in [0, -2] {
            let result = f.orders.update_detail_quantity(detail_id, quantity).await;
            assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        }

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.details[0].quantity, 3);
        assert_eq!(reloaded.total, Money::from_cents(2997));
        assert_eq!(reloaded.version, order.version);
    }

    #[tokio::test]
    async fn overflowing_line_total_writes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Gold bar", i64::MAX / 2).await;

        let result = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn overflowing_order_total_writes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Gold bar", i64::MAX / 2 + 1).await;

        let result = f
            .orders
            .create_order(CreateOrder::new(
                person_id,
                vec![OrderLine::new(item_id, 1), OrderLine::new(item_id, 1)],
            ))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn add_detail_overflowing_total_changes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Gold bar", i64::MAX / 2 + 1).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();

        let result = f
            .orders
            .add_detail(AddDetail::new(order.id, item_id, 1))
            .await;
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.details.len(), 1);
        assert_eq!(reloaded.total, order.total);
        assert_eq!(reloaded.version, order.version);
        assert_eq!(f.store.detail_count().await, 1);
    }

    #[tokio::test]
    async fn update_quantity_overflowing_line_changes_nothing() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Gold bar", i64::MAX / 2).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();
        let detail_id = order.details[0].id;

        let result = f.orders.update_detail_quantity(detail_id, 3).await;
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.details[0].quantity, 1);
        assert_eq!(reloaded.total, Money::from_cents(i64::MAX / 2));
    }

    #[tokio::test]
    async fn add_detail_to_missing_order() {
        let f = fixture();
        let item_id = f.item("Widget", 100).await;

        let result = f
            .orders
            .add_detail(AddDetail::new(OrderId::new(5), item_id, 1))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound {
                entity: EntityKind::Order,
                ..
            })
        ));
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn update_missing_detail() {
        let f = fixture();
        let result = f
            .orders
            .update_detail_quantity(OrderDetailId::new(9), 2)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound {
                entity: EntityKind::OrderDetail,
                ..
            })
        ));
    }
}

mod cascades {
    use super::*;

    #[tokio::test]
    async fn delete_order_removes_details() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 100).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(
                person_id,
                vec![OrderLine::new(item_id, 1), OrderLine::new(item_id, 2)],
            ))
            .await
            .unwrap();
        let detail_id = order.details[0].id;

        assert!(f.orders.delete_order(order.id).await.unwrap());
        assert!(!f.orders.delete_order(order.id).await.unwrap());

        assert!(f.orders.get_order(order.id).await.unwrap().is_none());
        assert!(f.orders.get_detail(detail_id).await.unwrap().is_none());
        assert!(matches!(
            f.orders.list_details(order.id).await,
            Err(DomainError::ReferenceNotFound { .. })
        ));
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn delete_person_removes_orders() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 100).await;

        f.orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();

        assert!(f.persons.delete(person_id).await.unwrap());
        assert!(f.orders.list_orders().await.unwrap().is_empty());
        assert_eq!(f.store.detail_count().await, 0);
    }

    #[tokio::test]
    async fn delete_item_recomputes_affected_orders() {
        let f = fixture();
        let person_id = f.person().await;
        let kept = f.item("Kept", 300).await;
        let dropped = f.item("Dropped", 1000).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(
                person_id,
                vec![OrderLine::new(kept, 2), OrderLine::new(dropped, 1)],
            ))
            .await
            .unwrap();
        assert_eq!(order.total, Money::from_cents(1600));

        assert!(f.items.delete(dropped).await.unwrap());

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.details.len(), 1);
        assert_eq!(reloaded.total, Money::from_cents(600));
    }
}

mod pricing_and_concurrency {
    use super::*;

    #[tokio::test]
    async fn price_change_does_not_touch_existing_lines() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 999).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 3)]))
            .await
            .unwrap();

        f.items
            .update(
                item_id,
                ItemData {
                    name: "Widget".to_string(),
                    description: None,
                    price: Money::from_cents(1500),
                    stock: 50,
                },
            )
            .await
            .unwrap()
            .unwrap();

        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total, Money::from_cents(2997));
        assert_eq!(reloaded.details[0].unit_price, Money::from_cents(999));

        // Quantity changes keep using the captured unit price.
        let detail = f
            .orders
            .update_detail_quantity(order.details[0].id, 1)
            .await
            .unwrap();
        assert_eq!(detail.line_total, Money::from_cents(999));

        // New lines use the current price.
        let added = f
            .orders
            .add_detail(AddDetail::new(order.id, item_id, 1))
            .await
            .unwrap();
        assert_eq!(added.unit_price, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 100).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();
        let seen = order.version;

        // Any detail mutation bumps the order version.
        f.orders
            .add_detail(AddDetail::new(order.id, item_id, 1))
            .await
            .unwrap();

        let result = f
            .orders
            .update_order(UpdateOrder::new(order.id, Some("late".to_string())).expecting(seen))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { expected, .. }) if expected == seen
        ));
        let reloaded = f.orders.get_order(order.id).await.unwrap().unwrap();
        assert!(reloaded.notes.is_none());
    }

    #[tokio::test]
    async fn current_version_is_accepted() {
        let f = fixture();
        let person_id = f.person().await;
        let item_id = f.item("Widget", 100).await;

        let order = f
            .orders
            .create_order(CreateOrder::new(person_id, vec![OrderLine::new(item_id, 1)]))
            .await
            .unwrap();

        let updated = f
            .orders
            .update_order(
                UpdateOrder::new(order.id, Some("fragile".to_string())).expecting(order.version),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.notes.as_deref(), Some("fragile"));
        assert_eq!(updated.version, order.version.next());
        assert_ne!(updated.version, Version::first());
    }
}
