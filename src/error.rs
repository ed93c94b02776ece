//! Error types for inventory operations.

use thiserror::Error;

use crate::framework::StoreError;

/// Errors that can occur during product and catalog operations.
///
/// Not-found conditions are never errors; catalog operations report them as
/// `Ok(false)` or `None`.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The caller supplied an out-of-range or malformed argument.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A persisted entry does not have the expected shape.
    #[error("Malformed product data: {0}")]
    Format(String),

    /// The data file could not be read or written.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl InventoryError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        InventoryError::Validation(msg.into())
    }
}
