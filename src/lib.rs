//! # Inventory Tracker
//!
//! > **A single-user product inventory backed by one JSON file.**
//!
//! The crate keeps a catalog of products (id, name, category, price, quantity),
//! persists every change to disk before returning, and answers lookup,
//! aggregate-statistics and reporting queries for a numbered text menu.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### A generic store, a specific catalog
//!
//! Persistence is written once, in [`framework`], against the [`StoreEntity`](framework::StoreEntity)
//! trait. The [`Catalog`] wraps a `ResourceStore<Product>` and adds the domain
//! queries. Nothing in the framework knows what a product is.
//!
//! ### Resilient loading
//!
//! A missing file is an empty catalog. A malformed entry is logged and skipped.
//! A structurally broken file leaves the catalog empty and
//! [`Unavailable`](framework::StoreState::Unavailable) instead of aborting the
//! program.
//!
//! ### Memory never diverges from disk
//!
//! Every mutation is saved atomically (temp file, fsync, rename). If the save
//! fails the mutation is rolled back and the error is returned.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: keyed in-memory map plus the JSON load/save protocol and the path guard.
//! - **Key items**: [`ResourceStore`](framework::ResourceStore), [`StorePath`](framework::StorePath).
//!
//! ### 2. The Record ([`model`])
//! - **Role**: [`Product`](model::Product) with validated mutators and its on-disk shape.
//!
//! ### 3. The Catalog ([`catalog`])
//! - **Role**: CRUD, search, aggregates, [`full_analysis`](Catalog::full_analysis) and text reports.
//!
//! ### 4. The Glue ([`config`], [`input`], [`lifecycle`])
//! - **Role**: explicit configuration, interactive-input checks and logging bootstrap.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the menu with info logs
//! RUST_LOG=info cargo run
//!
//! # Point the catalog somewhere else
//! INVENTORY__DATA_DIR=/tmp/stock cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod framework;
pub mod input;
pub mod lifecycle;
pub mod model;

pub use catalog::Catalog;
pub use error::InventoryError;
