//! Orders: numbering, the weight rule, and the transactional write path.

mod commands;
mod number;
mod query;
mod service;
mod weight;

pub use commands::{CreateOrder, LineItem, MAX_QUANTITY, OrderDraft, ReplaceOrder};
pub use number::{OrderNumber, OrderNumberError};
pub use query::{OrderQueryService, filter_from_params};
pub use service::OrderService;
pub use weight::{MAX_ORDER_WEIGHT, check_weight_limit};
