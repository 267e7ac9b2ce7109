pub mod geo;
pub mod listing;
pub mod pagination;

pub use geo::GeoRanker;
pub use listing::{
    ListedItems, ListingConfig, ListingMode, ListingOutcome, ListingQuery, ListingRequest,
    ListingService,
};
pub use pagination::{
    Page, PageLimits, PageRequest, Pagination, Paginator, QueryPaginator, SlicePaginator,
};
