//! Backing-collection seam for the listing pipeline.

use super::filter::FilterExpr;
use super::sort::SortSpec;
use crate::models::{CatalogRecord, GeoPoint};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Server-side ordering and windowing for a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// `None` uses the store's natural order (newest first, then id).
    pub sort: Option<SortSpec>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FetchOptions {
    /// Every match, natural order, no window.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn window(sort: SortSpec, skip: u64, limit: u64) -> Self {
        Self {
            sort: Some(sort),
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    pub(crate) fn effective_sort(&self) -> SortSpec {
        self.sort.unwrap_or_default()
    }
}

/// Read-only access to catalog records and their owners.
///
/// Implementations must apply the same ordering rules for a given [`SortSpec`]
/// (ties broken by ascending id) so that paging is deterministic.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Count records matching `filter`.
    async fn count(&self, filter: &FilterExpr) -> Result<u64>;

    /// Fetch records matching `filter`, ordered and windowed per `options`.
    async fn fetch(&self, filter: &FilterExpr, options: &FetchOptions)
        -> Result<Vec<CatalogRecord>>;

    /// Look up owner locations for a batch of owner ids.
    ///
    /// Owners that do not exist or have no location are absent from the map.
    async fn owner_locations(&self, owner_ids: &[Uuid]) -> Result<HashMap<Uuid, GeoPoint>>;

    async fn owner_exists(&self, owner_id: Uuid) -> Result<bool>;
}
