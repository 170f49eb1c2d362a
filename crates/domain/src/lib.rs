//! Domain layer for the order management backend.
//!
//! This crate provides:
//! - Field validation for customers, products, and orders
//! - The sequential order number allocator
//! - The transactional order write path with the cumulative weight limit
//! - Read-only order queries and the customer/product services

pub mod customer;
pub mod error;
pub mod order;
pub mod product;
pub mod transaction;
pub mod validation;

pub use customer::{CustomerDirectory, CustomerInput};
pub use error::{DomainError, Entity};
pub use order::{
    CreateOrder, LineItem, MAX_ORDER_WEIGHT, OrderDraft, OrderNumber, OrderNumberError,
    OrderQueryService, OrderService, ReplaceOrder, filter_from_params,
};
pub use product::{MAX_PRODUCT_WEIGHT, MIN_PRODUCT_WEIGHT, ProductCatalog, ProductInput};
pub use validation::FieldErrors;

pub use store::{Customer, Order, OrderFilter, OrderItem, Product};
