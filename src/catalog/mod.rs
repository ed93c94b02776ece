//! # Product Catalog
//!
//! The [`Catalog`] is the inventory: an id-keyed set of [`Product`]s backed by a
//! JSON file, plus the search and aggregate operations the menu exposes.
//!
//! ## Structure
//!
//! - [`entity`] - [`StoreEntity`](crate::framework::StoreEntity) implementation for [`Product`]
//! - [`analysis`] - [`Catalog::full_analysis`] and its report types
//! - [`reports`] - Plain-text reports
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inventory_tracker::catalog::Catalog;
//! use inventory_tracker::model::Product;
//!
//! # fn main() -> Result<(), inventory_tracker::InventoryError> {
//! let mut catalog = Catalog::open("data/inventory.json");
//! catalog.add(Product::new("TEST001", "Widget", "Tools", 100.0, 10)?)?;
//! catalog.update_stock("TEST001", 4)?;
//! assert_eq!(catalog.low_stock(10).len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Persistence
//!
//! Every mutating call rewrites the whole file before returning. Ordering of
//! every returned list is by product id.

pub mod analysis;
pub mod entity;
pub mod reports;

pub use analysis::*;

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::InventoryConfig;
use crate::error::InventoryError;
use crate::framework::{ResourceStore, StoreError, StoreLimits, StorePath, StoreState};
use crate::model::product::check_price;
use crate::model::Product;

/// Threshold used for low-stock queries when the caller has no preference.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// In-memory product collection mirrored to a JSON file.
#[derive(Debug)]
pub struct Catalog {
    store: ResourceStore<Product>,
}

impl Catalog {
    /// Opens the catalog stored at `path`, confined to the path's parent directory.
    ///
    /// Never fails: an unusable file or a rejected path yields an empty catalog
    /// (see [`Catalog::state`]).
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with(StorePath::standalone(path), StoreLimits::default())
    }

    /// Opens the catalog described by `config` (`data_dir` / `data_file`).
    pub fn with_config(config: &InventoryConfig) -> Self {
        Self::open_with(config.store_path(), config.store_limits())
    }

    fn open_with(location: Result<StorePath, StoreError>, limits: StoreLimits) -> Self {
        Self {
            store: ResourceStore::open(location, limits),
        }
    }

    /// Whether the initial load succeeded.
    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // --- CRUD ---

    /// Adds a product. Returns `Ok(false)` and changes nothing if the id exists.
    pub fn add(&mut self, product: Product) -> Result<bool, InventoryError> {
        Ok(self.store.insert(product)?)
    }

    /// Removes a product. Returns `Ok(false)` if the id is absent.
    pub fn remove(&mut self, id: &str) -> Result<bool, InventoryError> {
        Ok(self.store.remove(id)?)
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.store.get(id)
    }

    /// Sets the stock level of `id`. Returns `Ok(false)` if the id is absent.
    pub fn update_stock(&mut self, id: &str, quantity: u32) -> Result<bool, InventoryError> {
        self.store.update(id, |product| {
            product.update_quantity(quantity);
            Ok(())
        })
    }

    /// Sets the price of `id`. Returns `Ok(false)` if the id is absent.
    ///
    /// # Errors
    /// [`InventoryError::Validation`] for a negative or non-finite price, even
    /// when the id is absent.
    pub fn update_price(&mut self, id: &str, price: f64) -> Result<bool, InventoryError> {
        check_price(price)?;
        self.store.update(id, |product| product.update_price(price))
    }

    // --- Queries ---

    /// Case-insensitive substring match on the name.
    pub fn find_by_name(&self, needle: &str) -> Vec<&Product> {
        let needle = needle.to_lowercase();
        self.filter(|p| p.name().to_lowercase().contains(&needle))
    }

    /// Case-insensitive substring match on the category.
    pub fn find_by_category(&self, needle: &str) -> Vec<&Product> {
        let needle = needle.to_lowercase();
        self.filter(|p| p.category().to_lowercase().contains(&needle))
    }

    pub fn all(&self) -> Vec<&Product> {
        self.store.iter().collect()
    }

    /// Products with `quantity < threshold`.
    pub fn low_stock(&self, threshold: u32) -> Vec<&Product> {
        self.filter(|p| p.quantity() < threshold)
    }

    fn filter(&self, keep: impl Fn(&Product) -> bool) -> Vec<&Product> {
        self.store.iter().filter(|p| keep(p)).collect()
    }

    // --- Aggregates ---

    /// Sum of `price * quantity` over every product; `0` when empty.
    pub fn total_value(&self) -> f64 {
        self.store.iter().map(Product::total_value).sum()
    }

    /// Highest price. Ties go to the lowest id.
    pub fn most_expensive(&self) -> Option<&Product> {
        self.store
            .iter()
            .reduce(|best, p| if p.price() > best.price() { p } else { best })
    }

    /// Lowest price. Ties go to the lowest id.
    pub fn cheapest(&self) -> Option<&Product> {
        self.store
            .iter()
            .reduce(|best, p| if p.price() < best.price() { p } else { best })
    }

    /// Mean price per category. Only categories with products appear.
    pub fn average_price_by_category(&self) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
        for p in self.store.iter() {
            let entry = sums.entry(p.category()).or_insert((0.0, 0));
            entry.0 += p.price();
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(category, (sum, count))| (category.to_string(), sum / f64::from(count)))
            .collect()
    }

    /// Values the stock with `price * factor_above` for products priced above
    /// `threshold` and `price * factor_below` for the rest.
    ///
    /// # Errors
    /// [`InventoryError::Validation`] if `threshold` or either factor is not positive.
    pub fn value_with_tiered_pricing(
        &self,
        threshold: f64,
        factor_above: f64,
        factor_below: f64,
    ) -> Result<f64, InventoryError> {
        for (name, value) in [
            ("price threshold", threshold),
            ("factor above threshold", factor_above),
            ("factor below threshold", factor_below),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InventoryError::validation(format!("{name} must be positive")));
            }
        }

        Ok(self
            .store
            .iter()
            .map(|p| {
                let factor = if p.price() > threshold {
                    factor_above
                } else {
                    factor_below
                };
                p.price() * factor
            })
            .sum())
    }
}
