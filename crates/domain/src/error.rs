//! Domain error types.

use std::fmt;

use common::Weight;
use store::StoreError;
use thiserror::Error;

use crate::validation::FieldErrors;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Product,
    Order,
}

impl Entity {
    /// Returns the lowercase name used in error messages and field paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Customer => "customer",
            Entity::Product => "product",
            Entity::Order => "order",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more input fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The record addressed by the operation doesn't exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A record referenced from the input doesn't exist.
    #[error("Referenced {entity} {id} does not exist")]
    UnknownReference { entity: Entity, id: i64 },

    /// A uniqueness rule rejected the write.
    #[error("Conflict on {constraint}: {detail}")]
    Conflict { constraint: String, detail: String },

    /// The order would weigh more than the allowed maximum.
    #[error("Order total weight {total} kg exceeds the {limit} kg limit")]
    WeightLimitExceeded { total: Weight, limit: Weight },

    /// The storage layer failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn not_found(entity: Entity, id: impl Into<i64>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn unknown_reference(entity: Entity, id: impl Into<i64>) -> Self {
        DomainError::UnknownReference {
            entity,
            id: id.into(),
        }
    }

    /// Builds a validation error carrying a single field message.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        DomainError::Validation(errors)
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { constraint, detail } => {
                DomainError::Conflict { constraint, detail }
            }
            other => DomainError::Store(other),
        }
    }
}

impl From<FieldErrors> for DomainError {
    fn from(errors: FieldErrors) -> Self {
        DomainError::Validation(errors)
    }
}
