//! Catalog listing server
//!
//! Paginated, searchable catalog listings with optional ranking by distance from the
//! requester. Records live behind a [`db::CatalogStore`]; the listing pipeline in
//! [`services::listing`] composes filters, ranks and paginates; [`api`] exposes it over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
