//! Product CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ProductId, Weight};
use domain::{Product, ProductInput};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

// -- Request types --

/// A weight as submitted: either `"12.50"` or `12.5`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum WeightInput {
    Text(String),
    Number(serde_json::Number),
}

impl WeightInput {
    fn into_text(self) -> String {
        match self {
            WeightInput::Text(s) => s,
            WeightInput::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub weight: WeightInput,
}

impl From<ProductRequest> for ProductInput {
    fn from(req: ProductRequest) -> Self {
        ProductInput::new(req.name, req.weight.into_text())
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    /// Decimal string with two fractional digits.
    pub weight: Weight,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            weight: p.weight,
        }
    }
}

// -- Handlers --

/// GET /products/
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.list().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// POST /products/
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(req) = payload?;
    let product = state.products.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/{id}
#[tracing::instrument(skip(state, id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Path(id) = id?;
    let product = state.products.get(ProductId::new(id)).await?;
    Ok(Json(product.into()))
}

/// PUT /products/{id}
#[tracing::instrument(skip(state, id, payload))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let product = state
        .products
        .update(ProductId::new(id), req.into())
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /products/{id} also removes order items for the product.
#[tracing::instrument(skip(state, id))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.products.delete(ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
