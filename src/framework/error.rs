//! # Store Errors
//!
//! Failures raised by the persistence engine itself. Messages never include the
//! backing file path; paths are recorded in log fields only.

/// Errors that can occur while persisting a [`ResourceStore`](super::ResourceStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O failure while accessing the data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode the data file: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Data file location rejected: {0}")]
    PathRejected(String),

    #[error("Data file exceeds the configured size limit ({size} > {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
}
