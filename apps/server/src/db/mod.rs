//! Database layer - backing collection access for catalog listings

pub mod bind;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod sort;
pub mod store;

pub use filter::{compose, FilterAtom, FilterExpr, FilterField, FilterValue, TextField};
pub use memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use sort::{SortDirection, SortField, SortSpec};
pub use store::{CatalogStore, FetchOptions};
