//! Listing service - paginated, searchable, distance-aware catalog listings
//!
//! Each call runs one of two flows:
//! - Unranked: compose filter -> count + windowed fetch in the store, ordered by the
//!   requested sort.
//! - Ranked: compose filter -> fetch every match -> join owner locations -> rank by
//!   distance -> slice the ranked sequence in memory. The requested sort is ignored.

use crate::config::ListingSettings;
use crate::db::{
    compose, CatalogStore, FetchOptions, FilterExpr, SortDirection, SortField, SortSpec,
    TextField,
};
use crate::metrics;
use crate::models::{CatalogRecord, GeoPoint, RankedRecord};
use crate::services::geo::GeoRanker;
use crate::services::pagination::{
    PageLimits, PageRequest, Paginator, Pagination, QueryPaginator, SlicePaginator,
};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Explicit pipeline configuration, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingConfig {
    pub page_limits: PageLimits,
    pub search_fields: Vec<TextField>,
    pub earth_radius_km: f64,
    pub default_sort: SortSpec,
}

impl ListingConfig {
    pub fn from_settings(settings: &ListingSettings) -> Result<Self> {
        let search_fields = settings
            .search_fields
            .iter()
            .map(|f| {
                TextField::parse(f)
                    .ok_or_else(|| Error::Config(format!("unknown search field '{f}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            page_limits: PageLimits {
                default_page_size: settings.default_page_size,
                max_page_size: settings.max_page_size,
            },
            search_fields,
            earth_radius_km: settings.earth_radius_km,
            default_sort: SortSpec::new(settings.default_sort_field, settings.default_sort_order),
        })
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_limits: PageLimits::default(),
            search_fields: vec![TextField::Name, TextField::Description],
            earth_radius_km: crate::services::geo::EARTH_RADIUS_KM,
            default_sort: SortSpec::default(),
        }
    }
}

/// Raw listing parameters as received at the boundary. Every value is kept as text so
/// that nothing malformed can reject the request before it is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl ListingQuery {
    /// Build from ordered query items; the last occurrence of a key wins.
    pub fn from_items(items: &[(String, String)]) -> Self {
        let mut query = Self::default();
        for (key, value) in items {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "pageSize" | "page_size" | "limit" => &mut query.page_size,
                "search" | "q" => &mut query.search,
                "sort" | "sortBy" => &mut query.sort,
                "order" | "sortOrder" => &mut query.order,
                "latitude" | "lat" => &mut query.latitude,
                "longitude" | "lng" | "lon" => &mut query.longitude,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        query
    }

    /// Whether the caller supplied either coordinate, valid or not.
    fn has_coordinates(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }

    fn coordinates(&self) -> Option<GeoPoint> {
        let lat = parse_coordinate(self.latitude.as_deref())?;
        let lon = parse_coordinate(self.longitude.as_deref())?;
        GeoPoint::checked(lat, lon)
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Which flow a request runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Unranked,
    Ranked,
}

impl ListingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unranked => "unranked",
            Self::Ranked => "ranked",
        }
    }
}

/// A fully resolved listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    pub page: PageRequest,
    pub search: Option<String>,
    pub sort: SortSpec,
    /// Requester position; `Some` switches the request to distance ranking.
    pub origin: Option<GeoPoint>,
}

impl ListingRequest {
    /// Resolve raw parameters. Explicit query coordinates take precedence over the
    /// requester's stored location, which is only consulted when neither coordinate
    /// is supplied. Supplied but invalid coordinates disable ranking.
    pub fn from_query(
        query: &ListingQuery,
        stored_location: Option<GeoPoint>,
        config: &ListingConfig,
    ) -> Self {
        let page = PageRequest::from_raw(
            query.page.as_deref(),
            query.page_size.as_deref(),
            &config.page_limits,
        );

        let sort = SortSpec::new(
            query
                .sort
                .as_deref()
                .and_then(SortField::parse)
                .unwrap_or(config.default_sort.field),
            query
                .order
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or(config.default_sort.direction),
        );

        let origin = if query.has_coordinates() {
            query.coordinates()
        } else {
            stored_location.filter(GeoPoint::is_valid)
        };

        Self {
            page,
            search: query.search.clone(),
            sort,
            origin,
        }
    }

    pub fn mode(&self) -> ListingMode {
        if self.origin.is_some() {
            ListingMode::Ranked
        } else {
            ListingMode::Unranked
        }
    }
}

/// Listed items: plain records when unranked, distance-annotated when ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListedItems {
    Plain(Vec<CatalogRecord>),
    Ranked(Vec<RankedRecord>),
}

impl ListedItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Plain(items) => items.len(),
            Self::Ranked(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<Uuid> {
        match self {
            Self::Plain(items) => items.iter().map(|r| r.id).collect(),
            Self::Ranked(items) => items.iter().map(|r| r.record.id).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingOutcome {
    pub items: ListedItems,
    pub pagination: Pagination,
    /// The ordering that produced the page; `None` when ranked by distance.
    pub effective_sort: Option<SortSpec>,
}

impl ListingOutcome {
    pub fn mode(&self) -> ListingMode {
        match self.items {
            ListedItems::Plain(_) => ListingMode::Unranked,
            ListedItems::Ranked(_) => ListingMode::Ranked,
        }
    }
}

/// Runs listing requests against a backing collection. Holds no per-request state.
pub struct ListingService {
    store: Arc<dyn CatalogStore>,
    config: ListingConfig,
    ranker: GeoRanker,
}

impl ListingService {
    pub fn new(store: Arc<dyn CatalogStore>, config: ListingConfig) -> Self {
        let ranker = GeoRanker::new(config.earth_radius_km);
        Self {
            store,
            config,
            ranker,
        }
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// List records matching `base`, narrowed by the request's search term.
    #[tracing::instrument(
        name = "listing",
        skip_all,
        fields(
            mode = request.mode().as_str(),
            page = request.page.page,
            page_size = request.page.page_size,
        )
    )]
    pub async fn list(&self, base: FilterExpr, request: &ListingRequest) -> Result<ListingOutcome> {
        let start = Instant::now();
        let mode = request.mode();
        let filter = compose(base, request.search.as_deref(), &self.config.search_fields);

        let outcome = match request.origin {
            None => self.list_unranked(&filter, request).await,
            Some(origin) => self.list_ranked(&filter, origin, request).await,
        };

        metrics::LISTING_REQUESTS_TOTAL
            .with_label_values(&[
                mode.as_str(),
                if outcome.is_ok() { "success" } else { "error" },
            ])
            .inc();
        metrics::LISTING_DURATION_SECONDS
            .with_label_values(&[mode.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match &outcome {
            Ok(o) => tracing::debug!(
                returned = o.items.len(),
                total = o.pagination.total_items,
                "Listing completed"
            ),
            Err(e) => tracing::warn!(error = %e, "Listing failed"),
        }

        outcome
    }

    /// List the active records of one pharmacy.
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        request: &ListingRequest,
    ) -> Result<ListingOutcome> {
        if !self.store.owner_exists(owner_id).await? {
            return Err(Error::NotFound(format!("Pharmacy {owner_id}")));
        }
        self.list(FilterExpr::owned_by(owner_id), request).await
    }

    async fn list_unranked(
        &self,
        filter: &FilterExpr,
        request: &ListingRequest,
    ) -> Result<ListingOutcome> {
        let page = QueryPaginator::new(self.store.as_ref(), filter, request.sort)
            .paginate(request.page)
            .await?;

        Ok(ListingOutcome {
            items: ListedItems::Plain(page.items),
            pagination: page.pagination,
            effective_sort: Some(request.sort),
        })
    }

    async fn list_ranked(
        &self,
        filter: &FilterExpr,
        origin: GeoPoint,
        request: &ListingRequest,
    ) -> Result<ListingOutcome> {
        let candidates = self.store.fetch(filter, &FetchOptions::all()).await?;
        metrics::LISTING_CANDIDATES.observe(candidates.len() as f64);

        let mut owner_ids: Vec<Uuid> = candidates.iter().map(|r| r.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let locations = if owner_ids.is_empty() {
            Default::default()
        } else {
            self.store.owner_locations(&owner_ids).await?
        };

        let ranked = self.ranker.rank(
            candidates.into_iter().map(|record| {
                let location = locations.get(&record.owner_id).copied();
                (record, location)
            }),
            origin,
        );

        let page = SlicePaginator::new(ranked).paginate(request.page).await?;

        Ok(ListingOutcome {
            items: ListedItems::Ranked(page.items),
            pagination: page.pagination,
            effective_sort: None,
        })
    }
}
