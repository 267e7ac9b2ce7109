//! Catalog listing routes

use crate::api::handlers::listing;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/medicines", get(listing::list_medicines))
        .route(
            "/pharmacies/:pharmacy_id/medicines",
            get(listing::list_pharmacy_medicines),
        )
}
