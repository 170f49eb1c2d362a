//! HTTP API server for the order management backend.
//!
//! Provides REST endpoints for customers, products, and orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// Collection routes answer both with and without a trailing slash.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{customers, orders, products};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let customer_collection = get(customers::list::<S>).post(customers::create::<S>);
    let product_collection = get(products::list::<S>).post(products::create::<S>);
    let order_collection = get(orders::list::<S>).post(orders::create::<S>);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/customers", customer_collection.clone())
        .route("/customers/", customer_collection)
        .route(
            "/customers/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route("/products", product_collection.clone())
        .route("/products/", product_collection)
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route("/orders", order_collection.clone())
        .route("/orders/", order_collection)
        .route(
            "/orders/{id}",
            get(orders::get::<S>)
                .put(orders::replace::<S>)
                .delete(orders::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state backed by `store`.
pub fn create_default_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
