//! The cumulative weight rule for orders.

use common::Weight;

use crate::error::DomainError;

/// Heaviest total an order may reach, inclusive.
pub const MAX_ORDER_WEIGHT: Weight = Weight::from_kg(150);

/// Fails with `WeightLimitExceeded` when `total` is above `limit`.
pub fn check_weight_limit(total: Weight, limit: Weight) -> Result<(), DomainError> {
    if total > limit {
        return Err(DomainError::WeightLimitExceeded { total, limit });
    }
    Ok(())
}
