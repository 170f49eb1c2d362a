//! Customer CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::{Customer, CustomerInput};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    pub email: String,
}

impl From<CustomerRequest> for CustomerInput {
    fn from(req: CustomerRequest) -> Self {
        CustomerInput::new(req.name, req.contact_number, req.email)
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            contact_number: c.contact_number,
            email: c.email,
        }
    }
}

// -- Handlers --

/// GET /customers/
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.customers.list().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// POST /customers/
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let Json(req) = payload?;
    let customer = state.customers.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state, id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let Path(id) = id?;
    let customer = state.customers.get(CustomerId::new(id)).await?;
    Ok(Json(customer.into()))
}

/// PUT /customers/{id} replaces every field.
#[tracing::instrument(skip(state, id, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let customer = state
        .customers
        .update(CustomerId::new(id), req.into())
        .await?;
    Ok(Json(customer.into()))
}

/// DELETE /customers/{id}
#[tracing::instrument(skip(state, id))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.customers.delete(CustomerId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
