//! Row types exchanged with the store.

use chrono::NaiveDate;
use common::{CustomerId, OrderId, OrderItemId, ProductId, Weight};

/// Width of the order number column: `ORD` plus the twenty digits of
/// `u64::MAX`, so every counter value has a representable number.
pub const ORDER_NUMBER_MAX_LEN: usize = 23;

/// A persisted customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

/// Writable customer columns, used for both insert and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFields {
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub weight: Weight,
}

/// Writable product columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub weight: Weight,
}

/// Mutable columns of an order row. The order number is written once on
/// insert and is deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeader {
    pub customer: Option<CustomerId>,
    pub order_date: NaiveDate,
    pub address: String,
}

/// A persisted order line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product: ProductId,
    pub quantity: u32,
}

/// A persisted order with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer: Option<CustomerId>,
    pub order_date: NaiveDate,
    pub address: String,
    /// Line items in insertion order.
    pub items: Vec<OrderItem>,
    /// Sum of quantity x product weight over all items.
    pub total_weight: Weight,
}

/// Filter for listing orders.
///
/// `products` matches orders containing at least one item whose product name
/// is in the list. `customer` matches the customer's name exactly. Present
/// filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub products: Option<Vec<String>>,
    pub customer: Option<String>,
}

impl OrderFilter {
    /// Creates an empty filter matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to orders containing any of the given product names.
    pub fn with_products<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts to orders of the customer with this exact name.
    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer = Some(name.into());
        self
    }
}
