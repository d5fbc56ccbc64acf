use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    Item, ItemData, ItemId, Money, NewOrder, NewOrderDetail, Order, OrderDetail, OrderDetailId,
    OrderId, Person, PersonData, PersonId, Result, StoreError,
    store::{Store, Transaction},
    version::Version,
};

const PERSON_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, name, description, price_cents, stock, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, person_id, number, notes, total_cents, version, created_at, updated_at";
const DETAIL_COLUMNS: &str = "id, order_id, item_id, quantity, unit_price_cents, line_total_cents, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

/// Unit of work backed by a database transaction.
///
/// Dropping it without calling [`Transaction::commit`] rolls back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn row_to_person(row: PgRow) -> Result<Person> {
    Ok(Person {
        id: PersonId::new(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_item(row: PgRow) -> Result<Item> {
    Ok(Item {
        id: ItemId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        person_id: PersonId::new(row.try_get("person_id")?),
        number: row.try_get("number")?,
        notes: row.try_get("notes")?,
        total: Money::from_cents(row.try_get("total_cents")?),
        version: Version::new(row.try_get("version")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_detail(row: PgRow) -> Result<OrderDetail> {
    Ok(OrderDetail {
        id: OrderDetailId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        item_id: ItemId::new(row.try_get("item_id")?),
        quantity: row.try_get("quantity")?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        line_total: Money::from_cents(row.try_get("line_total_cents")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn insert_person(&mut self, data: PersonData) -> Result<Person> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO persons (first_name, last_name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_person(row)
    }

    async fn find_person(&mut self, id: PersonId) -> Result<Option<Person>> {
        sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_person)
            .transpose()
    }

    async fn list_persons(&mut self) -> Result<Vec<Person>> {
        let rows = sqlx::query(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons ORDER BY id ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_person).collect()
    }

    async fn update_person(&mut self, id: PersonId, data: PersonData) -> Result<Option<Person>> {
        sqlx::query(&format!(
            r#"
            UPDATE persons
            SET first_name = $1, last_name = $2, email = $3, phone = $4, address = $5,
                updated_at = now()
            WHERE id = $6
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_person)
        .transpose()
    }

    async fn delete_person(&mut self, id: PersonId) -> Result<bool> {
        // orders and order_details follow via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_item(&mut self, data: ItemData) -> Result<Item> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (name, description, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price.cents())
        .bind(data.stock)
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_item(row)
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_item)
            .transpose()
    }

    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_item)
            .transpose()
    }

    async fn list_items(&mut self) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn update_item(&mut self, id: ItemId, data: ItemData) -> Result<Option<Item>> {
        sqlx::query(&format!(
            r#"
            UPDATE items
            SET name = $1, description = $2, price_cents = $3, stock = $4, updated_at = now()
            WHERE id = $5
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price.cents())
        .bind(data.stock)
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_item)
        .transpose()
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        // number defaults to nextval('order_number_seq')
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (person_id, notes, total_cents)
            VALUES ($1, $2, $3)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.person_id.as_i64())
        .bind(&order.notes)
        .bind(order.total.cents())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_order(row)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_order)
            .transpose()
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn list_orders_for_person(&mut self, person_id: PersonId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE person_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(person_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn save_order(&mut self, order: &Order) -> Result<Order> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET notes = $1, total_cents = $2, version = version + 1, updated_at = now()
            WHERE id = $3 AND version = $4
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order.notes)
        .bind(order.total.cents())
        .bind(order.id.as_i64())
        .bind(order.version.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => row_to_order(row),
            None => {
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                        .bind(order.id.as_i64())
                        .fetch_optional(&mut *self.tx)
                        .await?;

                tracing::debug!(
                    order_id = %order.id,
                    expected = %order.version,
                    actual = ?actual,
                    "order version check failed"
                );
                Err(StoreError::ConcurrencyConflict {
                    order_id: order.id,
                    expected: order.version,
                    actual: actual.map(Version::new),
                })
            }
        }
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO order_details (order_id, item_id, quantity, unit_price_cents, line_total_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DETAIL_COLUMNS}
            "#
        ))
        .bind(detail.order_id().as_i64())
        .bind(detail.item_id().as_i64())
        .bind(detail.quantity())
        .bind(detail.unit_price().cents())
        .bind(detail.line_total().cents())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_detail(row)
    }

    async fn find_detail(&mut self, id: OrderDetailId) -> Result<Option<OrderDetail>> {
        sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_detail)
        .transpose()
    }

    async fn list_details_for_order(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_detail).collect()
    }

    async fn list_details_for_item(&mut self, item_id: ItemId) -> Result<Vec<OrderDetail>> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE item_id = $1 ORDER BY id ASC"
        ))
        .bind(item_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_detail).collect()
    }

    async fn save_detail(&mut self, detail: &OrderDetail) -> Result<Option<OrderDetail>> {
        sqlx::query(&format!(
            r#"
            UPDATE order_details
            SET quantity = $1, line_total_cents = $2, updated_at = now()
            WHERE id = $3
            RETURNING {DETAIL_COLUMNS}
            "#
        ))
        .bind(detail.quantity)
        .bind(detail.line_total.cents())
        .bind(detail.id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_detail)
        .transpose()
    }

    async fn delete_detail(&mut self, id: OrderDetailId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM order_details WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
