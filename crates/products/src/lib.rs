//! Catalog domain model: base products and their variants.
//!
//! Pure data + deterministic helpers (no IO, no storage). Ownership of a
//! variant by a base product is expressed only through
//! [`Variant::base_product_id`]; nothing here enforces that it resolves.

pub mod base_product;
pub mod ean;
pub mod size;
pub mod variant;

pub use base_product::BaseProduct;
pub use ean::Ean;
pub use size::{parse_size, Unit, Volume};
pub use variant::Variant;
