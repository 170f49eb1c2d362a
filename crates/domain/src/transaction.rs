//! Scoped transaction handling for the write path.

use store::StoreTransaction;

use crate::error::DomainError;

/// Ends a transaction according to the outcome of the work done in it.
///
/// Commits when `outcome` is Ok, otherwise rolls back and returns the
/// original error. A failed rollback is logged and the backend discards the
/// transaction when it is dropped.
pub async fn finish<T>(
    tx: Box<dyn StoreTransaction>,
    outcome: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
