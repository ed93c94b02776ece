//! [`StoreEntity`] implementation for the Product domain type.
//!
//! This is the only place that ties [`Product`] to the generic
//! [`ResourceStore`](crate::framework::ResourceStore): it names the `products`
//! collection and routes entry encoding through [`Product::to_value`] and
//! [`Product::from_value`].

use serde_json::Value;

use crate::error::InventoryError;
use crate::framework::StoreEntity;
use crate::model::Product;

impl StoreEntity for Product {
    type Id = String;
    type Error = InventoryError;

    const COLLECTION: &'static str = "products";
    const COLLECTION_ALIASES: &'static [&'static str] = &["productos"];

    fn id(&self) -> &String {
        self.key()
    }

    fn encode(&self) -> Value {
        self.to_value()
    }

    fn decode(value: Value) -> Result<Self, InventoryError> {
        Product::from_value(value)
    }
}
