//! Shared identifier and value types.

pub mod types;
pub mod weight;

pub use types::{CustomerId, OrderId, OrderItemId, ProductId};
pub use weight::{Weight, WeightParseError};
