//! Generic persistence framework for keyed resource collections.
//!
//! This module provides the building blocks for keeping a typed collection in
//! memory and mirroring it to a single JSON file.
//!
//! # Main Components
//!
//! - [`StoreEntity`] - Trait that resource types implement to be stored
//! - [`ResourceStore`] - Generic keyed collection with load/save-on-write
//! - [`StorePath`] - Confinement guard for the data file location
//! - [`StoreError`] - Storage failures

pub mod core;
pub mod error;
pub mod path;

// Re-export core types for convenience
pub use self::core::{LoadSummary, ResourceStore, StoreEntity, StoreLimits, StoreState};
pub use error::StoreError;
pub use path::StorePath;
