//! Shared application state

use crate::config::{Config, StorageBackend};
use crate::db::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use crate::services::{ListingConfig, ListingService};
use crate::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub listing: Arc<ListingService>,
    /// Present only for the Postgres backend.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Connect the configured backend and build the listing service.
    pub async fn new(config: Config) -> Result<Self> {
        match config.database.backend {
            StorageBackend::Postgres => {
                let pool = connect(&config).await?;
                let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
                let mut state = Self::with_store(config, store)?;
                state.db_pool = Some(pool);
                Ok(state)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory catalog store; data is not persisted");
                Self::with_store(config, Arc::new(InMemoryCatalogStore::new()))
            }
        }
    }

    /// Build state around an already constructed store.
    pub fn with_store(config: Config, store: Arc<dyn CatalogStore>) -> Result<Self> {
        let listing_config = ListingConfig::from_settings(&config.listing)?;
        Ok(Self {
            config: Arc::new(config),
            listing: Arc::new(ListingService::new(store, listing_config)),
            db_pool: None,
        })
    }
}

async fn connect(config: &Config) -> Result<PgPool> {
    let db = &config.database;
    let pool = PgPoolOptions::new()
        .min_connections(db.pool_min_size)
        .max_connections(db.pool_max_size)
        .acquire_timeout(Duration::from_secs(db.pool_timeout_seconds))
        .connect(&db.url)
        .await?;

    tracing::info!(
        min_connections = db.pool_min_size,
        max_connections = db.pool_max_size,
        "Database pool established"
    );

    if db.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
