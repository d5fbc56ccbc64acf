//! Person CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Person, PersonData, PersonId};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, check_body_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PersonRequest {
    /// Only checked against the path on updates.
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<PersonRequest> for PersonData {
    fn from(req: PersonRequest) -> Self {
        PersonData {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            address: req.address,
        }
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct PersonResponse {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        PersonResponse {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            email: person.email,
            phone: person.phone,
            address: person.address,
            created_at: person.created_at,
            updated_at: person.updated_at,
        }
    }
}

// -- Handlers --

/// POST /persons
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<PersonRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PersonResponse>), ApiError> {
    let Json(req) = payload?;
    let person = state.persons.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(person.into())))
}

/// GET /persons
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<PersonResponse>>, ApiError> {
    let persons = state.persons.list().await?;
    Ok(Json(persons.into_iter().map(Into::into).collect()))
}

/// GET /persons/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<PersonId>,
) -> Result<Json<PersonResponse>, ApiError> {
    let person = state
        .persons
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Person {id} not found")))?;
    Ok(Json(person.into()))
}

/// PUT /persons/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<PersonId>,
    payload: Result<Json<PersonRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    check_body_id(id.as_i64(), req.id)?;

    state
        .persons
        .update(id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Person {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /persons/{id}: also removes the person's orders.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<PersonId>,
) -> Result<StatusCode, ApiError> {
    if state.persons.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Person {id} not found")))
    }
}
