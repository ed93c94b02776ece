use std::fmt::{self, Display};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InventoryError;

/// Represents a product in the inventory.
///
/// # Invariants
/// - `price` is finite and never negative.
/// - `quantity` is a `u32`, so it cannot go negative.
/// - `updated_at` is refreshed by every price or quantity change.
///
/// A `Product` is stored by a [`Catalog`](crate::catalog::Catalog) through its
/// on-disk shape, [`ProductRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: String,
    name: String,
    category: String,
    price: f64,
    quantity: u32,
    updated_at: NaiveDateTime,
}

impl Product {
    /// Creates a new Product stamped with the current local time.
    ///
    /// # Arguments
    /// * `id` - Unique identifier, chosen by the caller
    /// * `name` - Product name
    /// * `category` - Free-text category used for grouping
    /// * `price` - Unit price, must be finite and non-negative
    /// * `quantity` - Units in stock
    ///
    /// # Errors
    /// [`InventoryError::Validation`] if the id is blank or the price is invalid.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Result<Self, InventoryError> {
        let id = id.into();
        check_id(&id)?;
        check_price(price)?;
        Ok(Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            quantity,
            updated_at: now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The id as stored, for keyed collections.
    pub(crate) fn key(&self) -> &String {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Replaces the price and refreshes `updated_at`.
    pub fn update_price(&mut self, price: f64) -> Result<(), InventoryError> {
        check_price(price)?;
        self.price = price;
        self.updated_at = now();
        Ok(())
    }

    /// Replaces the stock level and refreshes `updated_at`.
    pub fn update_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.updated_at = now();
    }

    /// `price * quantity`.
    pub fn total_value(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Price after a percentage discount. Does not modify the product.
    ///
    /// # Errors
    /// [`InventoryError::Validation`] unless `0 <= percent <= 100`.
    pub fn apply_discount(&self, percent: f64) -> Result<f64, InventoryError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(InventoryError::validation(
                "discount percentage must be between 0 and 100",
            ));
        }
        Ok(self.price * (100.0 - percent) / 100.0)
    }

    /// Converts a signed amount (e.g. typed by a user) into a stock quantity.
    pub fn quantity_from(amount: i64) -> Result<u32, InventoryError> {
        if amount < 0 {
            return Err(InventoryError::validation("quantity cannot be negative"));
        }
        u32::try_from(amount).map_err(|_| InventoryError::validation("quantity is too large"))
    }

    /// The on-disk shape of this product.
    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity: self.quantity,
            updated_at: self.updated_at,
        }
    }

    /// Serializes to a JSON object with keys
    /// `id, name, category, price, quantity, updated_at`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "category": self.category,
            "price": self.price,
            "quantity": self.quantity,
            "updated_at": self.updated_at,
        })
    }

    /// Rebuilds a product from a JSON object, keeping the stored `updated_at`.
    ///
    /// # Errors
    /// [`InventoryError::Format`] for missing keys, wrong types, an unparseable
    /// timestamp, a blank id, or a negative price.
    pub fn from_value(value: Value) -> Result<Self, InventoryError> {
        let record: ProductRecord =
            serde_json::from_value(value).map_err(|e| InventoryError::Format(e.to_string()))?;
        Self::try_from(record)
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | {} | {} | Price: ${:.2} | Stock: {} | Updated: {}",
            self.id,
            self.name,
            self.category,
            self.price,
            self.quantity,
            self.updated_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// On-disk shape of a [`Product`].
///
/// Field aliases keep files written with the legacy Spanish keys readable;
/// files are always written with the English names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "categoria")]
    pub category: String,
    #[serde(alias = "precio")]
    pub price: f64,
    #[serde(alias = "cantidad")]
    pub quantity: u32,
    #[serde(alias = "fecha_actualizacion")]
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ProductRecord> for Product {
    type Error = InventoryError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        check_id(&record.id).map_err(|_| InventoryError::Format("blank product id".into()))?;
        check_price(record.price)
            .map_err(|_| InventoryError::Format(format!("invalid price for `{}`", record.id)))?;
        Ok(Self {
            id: record.id,
            name: record.name,
            category: record.category,
            price: record.price,
            quantity: record.quantity,
            updated_at: record.updated_at,
        })
    }
}

fn check_id(id: &str) -> Result<(), InventoryError> {
    if id.trim().is_empty() {
        return Err(InventoryError::validation("product id cannot be empty"));
    }
    Ok(())
}

/// Prices must be finite and non-negative.
pub(crate) fn check_price(price: f64) -> Result<(), InventoryError> {
    if !price.is_finite() {
        return Err(InventoryError::validation("price must be a finite number"));
    }
    if price < 0.0 {
        return Err(InventoryError::validation("price cannot be negative"));
    }
    Ok(())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
