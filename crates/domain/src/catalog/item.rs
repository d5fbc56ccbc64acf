use std::collections::BTreeSet;

use store::{Item, ItemData, ItemId, Store, Transaction};

use super::{MAX_NAME_LEN, limit_text, require_text};
use crate::error::DomainError;
use crate::order::recompute_order_total;

const MAX_DESCRIPTION_LEN: usize = 500;

fn validate(data: &ItemData) -> Result<(), DomainError> {
    require_text("name", &data.name, MAX_NAME_LEN)?;
    if let Some(description) = &data.description {
        limit_text("description", description, MAX_DESCRIPTION_LEN)?;
    }
    if !data.price.is_positive() {
        return Err(DomainError::InvalidArgument(format!(
            "price must be greater than 0, got {}",
            data.price
        )));
    }
    if data.stock < 0 {
        return Err(DomainError::InvalidArgument(format!(
            "stock must not be negative, got {}",
            data.stock
        )));
    }
    Ok(())
}

/// CRUD over catalog items.
///
/// Changing an item's price never touches existing order lines; they keep
/// the unit price captured when they were created.
pub struct ItemService<S: Store> {
    store: S,
}

impl<S: Store> ItemService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create(&self, data: ItemData) -> Result<Item, DomainError> {
        validate(&data)?;

        let mut tx = self.store.begin().await?;
        let item = tx.insert_item(data).await?;
        tx.commit().await?;

        tracing::info!(item_id = %item.id, price = %item.price, "item created");
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_item(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Item>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_items().await?)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update(&self, id: ItemId, data: ItemData) -> Result<Option<Item>, DomainError> {
        validate(&data)?;

        let mut tx = self.store.begin().await?;
        let updated = tx.update_item(id, data).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes an item and every order line that refers to it, then
    /// recomputes the totals of the orders that lost lines.
    ///
    /// The item is locked before its lines are listed, so a line added
    /// concurrently either commits first and is seen here, or fails once
    /// the item is gone.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ItemId) -> Result<bool, DomainError> {
        let mut tx = self.store.begin().await?;

        if tx.lock_item(id).await?.is_none() {
            return Ok(false);
        }

        let affected: BTreeSet<_> = tx
            .list_details_for_item(id)
            .await?
            .into_iter()
            .map(|detail| detail.order_id)
            .collect();

        tx.delete_item(id).await?;

        for order_id in &affected {
            if let Some(order) = tx.find_order(*order_id).await? {
                recompute_order_total(&mut tx, order).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(item_id = %id, orders = affected.len(), "item deleted");
        Ok(true)
    }
}
