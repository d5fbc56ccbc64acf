//! Catalog item CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Item, ItemData, ItemId, Money};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, check_body_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ItemRequest {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i32,
}

impl From<ItemRequest> for ItemData {
    fn from(req: ItemRequest) -> Self {
        ItemData {
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            stock: req.stock,
        }
    }
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        ItemResponse {
            id: item.id,
            name: item.name,
            description: item.description,
            price_cents: item.price.cents(),
            stock: item.stock,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// POST /items
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let Json(req) = payload?;
    let item = state.items.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /items
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.items.list().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .items
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    Ok(Json(item.into()))
}

/// PUT /items/{id}: existing order lines keep their captured price.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    check_body_id(id.as_i64(), req.id)?;

    state
        .items
        .update(id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /items/{id}: removes the item's order lines and re-totals
/// the orders that held them.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
) -> Result<StatusCode, ApiError> {
    if state.items.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Item {id} not found")))
    }
}
