//! Transactional storage for customers, products, and orders.
//!
//! Two backends implement [`Store`]: [`InMemoryStore`] for tests and local
//! development, and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    Customer, CustomerFields, ORDER_NUMBER_MAX_LEN, Order, OrderFilter, OrderHeader, OrderItem,
    Product, ProductFields,
};
pub use store::{Store, StoreTransaction};
