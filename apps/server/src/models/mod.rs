//! Domain models for the catalog server

pub mod catalog;

pub use catalog::{CatalogRecord, GeoPoint, Pharmacy, RankedRecord};
