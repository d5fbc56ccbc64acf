//! HTTP handlers grouped by resource.

pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod persons;

use domain::{ItemService, OrderService, PersonService};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub orders: OrderService<S>,
    pub persons: PersonService<S>,
    pub items: ItemService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            persons: PersonService::new(store.clone()),
            items: ItemService::new(store.clone()),
            store,
        }
    }
}

/// Rejects a body whose id disagrees with the id in the path.
fn check_body_id(path_id: i64, body_id: Option<i64>) -> Result<(), ApiError> {
    match body_id {
        Some(body_id) if body_id != path_id => Err(ApiError::BadRequest(format!(
            "id in body ({body_id}) does not match id in path ({path_id})"
        ))),
        _ => Ok(()),
    }
}
