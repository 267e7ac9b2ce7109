//! Page-number pagination with two interchangeable strategies
//!
//! - [`QueryPaginator`] lets the backing collection count, order and window.
//! - [`SlicePaginator`] slices a sequence that is already materialized and ordered.
//!
//! Both produce the same [`Pagination`] metadata for the same total and page request.

use crate::db::{CatalogStore, FetchOptions, FilterExpr, SortSpec};
use crate::models::CatalogRecord;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Page size bounds used to clamp incoming paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Resolve raw `page` / `pageSize` parameters.
    ///
    /// Missing, non-numeric or zero values fall back to page 1 and the default page
    /// size; a page size above `limits.max_page_size` also falls back to the default.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>, limits: &PageLimits) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let page_size = parse_positive(page_size)
            .filter(|size| *size <= limits.max_page_size)
            .unwrap_or(limits.default_page_size);
        Self { page, page_size }
    }

    /// Number of items before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(request.page_size));
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            items_per_page: request.page_size,
            has_next_page: u64::from(request.page) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Produce one page of items plus metadata.
#[async_trait]
pub trait Paginator: Send {
    type Item: Send;

    async fn paginate(self, request: PageRequest) -> Result<Page<Self::Item>>;
}

/// Server-side strategy: one count and one windowed fetch against the store.
pub struct QueryPaginator<'a> {
    store: &'a dyn CatalogStore,
    filter: &'a FilterExpr,
    sort: SortSpec,
}

impl<'a> QueryPaginator<'a> {
    pub fn new(store: &'a dyn CatalogStore, filter: &'a FilterExpr, sort: SortSpec) -> Self {
        Self {
            store,
            filter,
            sort,
        }
    }
}

#[async_trait]
impl<'a> Paginator for QueryPaginator<'a> {
    type Item = CatalogRecord;

    async fn paginate(self, request: PageRequest) -> Result<Page<CatalogRecord>> {
        let options = FetchOptions::window(
            self.sort,
            request.offset(),
            u64::from(request.page_size),
        );

        // Independent reads over the same filter.
        let (total, items) = futures::try_join!(
            self.store.count(self.filter),
            self.store.fetch(self.filter, &options)
        )?;

        Ok(Page {
            items,
            pagination: Pagination::new(request, total),
        })
    }
}

/// In-memory strategy: slice a pre-ordered sequence.
pub struct SlicePaginator<T> {
    items: Vec<T>,
}

impl<T> SlicePaginator<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T: Send> Paginator for SlicePaginator<T> {
    type Item = T;

    async fn paginate(self, request: PageRequest) -> Result<Page<T>> {
        let total = self.items.len() as u64;
        let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = self
            .items
            .into_iter()
            .skip(start)
            .take(request.page_size as usize)
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(request, total),
        })
    }
}
