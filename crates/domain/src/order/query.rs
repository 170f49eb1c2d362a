//! Read-only order listing.

use store::{Order, OrderFilter, Store};

use crate::error::DomainError;

/// Builds a filter from raw query parameters.
///
/// `products` is a comma-separated list of product names; surrounding
/// whitespace and empty entries are dropped. A parameter that ends up empty
/// is treated as absent. The customer name is matched exactly.
pub fn filter_from_params(products: Option<&str>, customer: Option<&str>) -> OrderFilter {
    let mut filter = OrderFilter::new();

    if let Some(raw) = products {
        let names: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        if !names.is_empty() {
            filter = filter.with_products(names);
        }
    }

    if let Some(name) = customer.filter(|name| !name.is_empty()) {
        filter = filter.with_customer(name);
    }

    filter
}

/// Read side for orders. Never mutates the store.
#[derive(Clone)]
pub struct OrderQueryService<S: Store> {
    store: S,
}

impl<S: Store> OrderQueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists committed orders matching `filter`, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let orders = self.store.list_orders(filter).await?;
        tracing::debug!(count = orders.len(), "orders listed");
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_names_are_split_and_trimmed() {
        let filter = filter_from_params(Some(" Widget, Gadget ,,"), None);
        assert_eq!(
            filter.products,
            Some(vec!["Widget".to_string(), "Gadget".to_string()])
        );
        assert_eq!(filter.customer, None);
    }

    #[test]
    fn empty_parameters_mean_no_filter() {
        assert_eq!(filter_from_params(Some(" , "), Some("")), OrderFilter::new());
        assert_eq!(filter_from_params(None, None), OrderFilter::new());
    }

    #[test]
    fn customer_name_is_kept_verbatim() {
        let filter = filter_from_params(None, Some("Alice Smith"));
        assert_eq!(filter.customer.as_deref(), Some("Alice Smith"));
    }
}
