//! Catalog listing handlers
//!
//! - `GET /api/v1/medicines`
//! - `GET /api/v1/pharmacies/{pharmacy_id}/medicines`

use crate::{
    api::requester::Requester,
    db::{FilterExpr, SortSpec},
    services::{ListedItems, ListingOutcome, ListingQuery, ListingRequest, Pagination},
    state::AppState,
    Error, Result,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub message: String,
    pub data: ListingData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    pub count: usize,
    pub medicines: ListedItems,
    pub pagination: Pagination,
    /// Effective ordering; omitted when ranked by distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked_by_distance: Option<bool>,
}

impl ListingResponse {
    fn from_outcome(outcome: ListingOutcome, message: impl Into<String>) -> Self {
        let ranked = outcome.effective_sort.is_none();
        Self {
            success: true,
            message: message.into(),
            data: ListingData {
                count: outcome.items.len(),
                medicines: outcome.items,
                pagination: outcome.pagination,
                sort: outcome.effective_sort,
                ranked_by_distance: ranked.then_some(true),
            },
        }
    }
}

fn resolve(state: &AppState, items: &[(String, String)], requester: &Requester) -> ListingRequest {
    let query = ListingQuery::from_items(items);
    ListingRequest::from_query(&query, requester.stored_location(), state.listing.config())
}

/// Public listing of active medicines.
pub async fn list_medicines(
    State(state): State<AppState>,
    requester: Requester,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Json<ListingResponse>> {
    let request = resolve(&state, &items, &requester);
    let outcome = state.listing.list(FilterExpr::active(), &request).await?;

    Ok(Json(ListingResponse::from_outcome(
        outcome,
        "Medicines retrieved successfully",
    )))
}

/// Active medicines offered by a single pharmacy.
pub async fn list_pharmacy_medicines(
    State(state): State<AppState>,
    Path(pharmacy_id): Path<String>,
    requester: Requester,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Json<ListingResponse>> {
    let pharmacy_id = Uuid::parse_str(&pharmacy_id)
        .map_err(|_| Error::Validation(format!("Invalid pharmacy id '{pharmacy_id}'")))?;

    let request = resolve(&state, &items, &requester);
    let outcome = state.listing.list_for_owner(pharmacy_id, &request).await?;

    Ok(Json(ListingResponse::from_outcome(
        outcome,
        "Pharmacy medicines retrieved successfully",
    )))
}
