//! Pure data structures stored by the [`ResourceStore`](crate::framework::ResourceStore).

pub mod product;

pub use product::*;
