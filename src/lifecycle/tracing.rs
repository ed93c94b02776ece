//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//! Verbosity is controlled by the `RUST_LOG` environment variable; with it unset
//! only errors are printed, which keeps the interactive menu readable.
//!
//! ## What Gets Traced
//!
//! - **Store lifecycle**: the file being opened and the load summary (loaded / skipped)
//! - **Mutations**: insert, remove and update with the entity id
//! - **Degraded loads**: every skipped entry and every fall-back to an empty catalog
//! - **Lookups**: at `debug` only
//!
//! ## Usage Examples
//!
//! ```bash
//! # Load summary and mutations
//! RUST_LOG=info cargo run
//!
//! # Include lookups and file locations
//! RUST_LOG=debug cargo run
//!
//! # Only the storage engine
//! RUST_LOG=inventory_tracker::framework=debug cargo run
//! ```
//!
//! ## Output
//!
//! Every store event carries `entity_type` so lines from different collections
//! can be told apart without module paths:
//!
//! ```text
//! WARN Skipping unreadable entry entity_type="Product" index=2 error=...
//! INFO Created entity_type="Product" id=TEST001 size=4
//! INFO Updated entity_type="Product" id=TEST001
//! ```

/// Installs the global `fmt` subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type identifies the source
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
