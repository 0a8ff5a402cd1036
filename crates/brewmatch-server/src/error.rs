//! Error types for the server-side item store.

use thiserror::Error;

/// Errors returned by [`ItemStore`](crate::store::ItemStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table '{table}' is keyed by '{existing}', not '{requested}'")]
    KeyAttributeConflict {
        table: String,
        existing: String,
        requested: String,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// Error code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::TableNotFound(_) => "TableNotFound",
            StoreError::KeyAttributeConflict { .. } | StoreError::Validation(_) => {
                "ValidationError"
            }
            StoreError::Io(_) | StoreError::Snapshot(_) => "InternalError",
        }
    }
}
