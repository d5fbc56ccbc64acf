use thiserror::Error;

use crate::{OrderId, Version};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order row was changed (or removed) by another writer since it
    /// was read.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {}",
        describe_actual(.actual)
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Option<Version>,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

fn describe_actual(actual: &Option<Version>) -> String {
    match actual {
        Some(version) => format!("version {version}"),
        None => "no row".to_string(),
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
