//! Order endpoints: create, replace, fetch, delete, and filtered listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{CustomerId, OrderId, OrderItemId, ProductId, Weight};
use domain::{CreateOrder, Order, OrderDraft, ReplaceOrder, filter_from_params};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct OrderRequest {
    pub customer: Option<i64>,
    pub order_date: NaiveDate,
    pub address: String,
    /// Honored on create only.
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product: i64,
    pub quantity: i64,
}

impl OrderRequest {
    fn into_draft(self) -> (Option<String>, OrderDraft) {
        let draft = self.order_items.into_iter().fold(
            OrderDraft::new(
                self.customer.map(CustomerId::new),
                self.order_date,
                self.address,
            ),
            |draft, item| draft.with_item(ProductId::new(item.product), item.quantity),
        );
        (self.order_number, draft)
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Comma-separated product names.
    pub products: Option<String>,
    pub customer: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub customer: Option<CustomerId>,
    pub order_date: NaiveDate,
    pub address: String,
    pub order_items: Vec<OrderItemResponse>,
    pub total_weight: Weight,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product: ProductId,
    pub quantity: u32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer: order.customer,
            order_date: order.order_date,
            address: order.address,
            order_items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product: item.product,
                    quantity: item.quantity,
                })
                .collect(),
            total_weight: order.total_weight,
        }
    }
}

// -- Handlers --

/// GET /orders/?products=A,B&customer=Name
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<OrderListQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let Query(query) = query?;
    let filter = filter_from_params(query.products.as_deref(), query.customer.as_deref());
    let orders = state.order_queries.list(&filter).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// POST /orders/ creates an order with its items in one transaction.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let (order_number, draft) = req.into_draft();

    let mut cmd = CreateOrder::new(draft);
    if let Some(number) = order_number {
        cmd = cmd.with_order_number(number);
    }

    let order = state.orders.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state, id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(id) = id?;
    let order = state.orders.get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id} replaces the header and the whole item set.
#[tracing::instrument(skip(state, id, payload))]
pub async fn replace<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let (_, draft) = req.into_draft();

    let order = state
        .orders
        .replace_order(ReplaceOrder::new(OrderId::new(id), draft))
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state, id))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.orders.delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
