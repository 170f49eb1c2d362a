use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint {constraint} violated: {detail}")]
    Conflict { constraint: String, detail: String },

    /// A stored value could not be represented in the domain type.
    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    /// The backend failed for a reason other than the database driver.
    #[error("Storage backend failure: {0}")]
    Backend(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
