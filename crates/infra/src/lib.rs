//! Infrastructure layer: document store access for the catalog.
//!
//! - [`gateway`]: the generic two-collection document interface plus its
//!   in-memory and Postgres implementations.
//! - [`catalog_store`]: typed access to base products and variants on top of
//!   any gateway.

pub mod catalog_store;
pub mod gateway;

pub use catalog_store::{fields, CatalogStore, Scan, Stored};
pub use gateway::{
    Collection, CollectionGateway, Document, GatewayError, GroupCount,
    InMemoryCollectionGateway, PostgresCollectionGateway, ID_FIELD,
};
