//! Order and order detail endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{
    AddDetail, CreateOrder, ItemId, OrderDetailId, OrderDetailView, OrderId, OrderLine, OrderView,
    PersonId, UpdateOrder, Version,
};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, check_body_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub person_id: PersonId,
    pub notes: Option<String>,
    #[serde(default)]
    pub details: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub id: Option<i64>,
    pub notes: Option<String>,
    /// Version the client last saw; omitted means last writer wins.
    pub version: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub number: i64,
    pub person_id: PersonId,
    pub person_name: Option<String>,
    pub notes: Option<String>,
    pub total_cents: i64,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub details: Vec<OrderDetailResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        OrderResponse {
            id: order.id,
            number: order.number,
            person_id: order.person_id,
            person_name: order.person_name,
            notes: order.notes,
            total_cents: order.total.cents(),
            version: order.version,
            created_at: order.created_at,
            updated_at: order.updated_at,
            details: order.details.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub item_name: Option<String>,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<OrderDetailView> for OrderDetailResponse {
    fn from(detail: OrderDetailView) -> Self {
        OrderDetailResponse {
            id: detail.id,
            order_id: detail.order_id,
            item_id: detail.item_id,
            item_name: detail.item_name,
            quantity: detail.quantity,
            unit_price_cents: detail.unit_price.cents(),
            line_total_cents: detail.line_total.cents(),
            created_at: detail.created_at,
            updated_at: detail.updated_at,
        }
    }
}

// -- Order handlers --

/// POST /orders: create an order priced from the current item prices.
///
/// An unknown person or item is the caller's mistake here, so it is a
/// 400 rather than a 404.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;

    let lines = req
        .details
        .iter()
        .map(|line| OrderLine::new(line.item_id, line.quantity))
        .collect();
    let mut cmd = CreateOrder::new(req.person_id, lines);
    if let Some(notes) = req.notes {
        cmd = cmd.with_notes(notes);
    }

    let order = state
        .orders
        .create_order(cmd)
        .await
        .map_err(ApiError::reference_as_bad_request)?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders: all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/person/{person_id}
#[tracing::instrument(skip(state))]
pub async fn list_for_person<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(person_id): Path<PersonId>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders_for_person(person_id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}: replace the notes of an order.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    check_body_id(id.as_i64(), req.id)?;

    let mut cmd = UpdateOrder::new(id, req.notes);
    if let Some(version) = req.version {
        cmd = cmd.expecting(Version::new(version));
    }

    state
        .orders
        .update_order(cmd)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /orders/{id}: removes the order and its lines.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    if state.orders.delete_order(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Order {id} not found")))
    }
}

// -- Detail handlers --

/// GET /orders/{id}/details
#[tracing::instrument(skip(state))]
pub async fn list_details<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<Vec<OrderDetailResponse>>, ApiError> {
    let details = state.orders.list_details(id).await?;
    Ok(Json(details.into_iter().map(Into::into).collect()))
}

/// POST /orders/{id}/details: append a line to an order.
#[tracing::instrument(skip(state, payload))]
pub async fn add_detail<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    payload: Result<Json<OrderLineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let Json(req) = payload?;
    let detail = state
        .orders
        .add_detail(AddDetail::new(id, req.item_id, req.quantity))
        .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// GET /orders/details/{id}
#[tracing::instrument(skip(state))]
pub async fn get_detail<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderDetailId>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let detail = state
        .orders
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order detail {id} not found")))?;
    Ok(Json(detail.into()))
}

/// PUT /orders/details/{id}/quantity: body is the bare new quantity.
#[tracing::instrument(skip(state, payload))]
pub async fn update_detail_quantity<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderDetailId>,
    payload: Result<Json<i32>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(quantity) = payload?;
    state.orders.update_detail_quantity(id, quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /orders/details/{id}
#[tracing::instrument(skip(state))]
pub async fn remove_detail<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderDetailId>,
) -> Result<StatusCode, ApiError> {
    if state.orders.remove_detail(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Order detail {id} not found")))
    }
}
