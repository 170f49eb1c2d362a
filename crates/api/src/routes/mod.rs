//! HTTP handlers grouped by resource.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use domain::{CustomerDirectory, OrderQueryService, OrderService, ProductCatalog};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub order_queries: OrderQueryService<S>,
    pub customers: CustomerDirectory<S>,
    pub products: ProductCatalog<S>,
}

impl<S: Store + Clone> AppState<S> {
    /// Builds every service on top of one store handle.
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            order_queries: OrderQueryService::new(store.clone()),
            customers: CustomerDirectory::new(store.clone()),
            products: ProductCatalog::new(store),
        }
    }
}
