//! Great-circle distance and distance ranking

use crate::models::{CatalogRecord, GeoPoint, RankedRecord};
use std::cmp::Ordering;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_km(EARTH_RADIUS_KM, lat1, lon1, lat2, lon2)
}

pub fn haversine_km(radius_km: f64, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` marginally above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    radius_km * c
}

/// Round to two decimals.
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

/// Orders candidate records by distance from a requester.
#[derive(Debug, Clone, Copy)]
pub struct GeoRanker {
    earth_radius_km: f64,
}

impl Default for GeoRanker {
    fn default() -> Self {
        Self::new(EARTH_RADIUS_KM)
    }
}

impl GeoRanker {
    pub fn new(earth_radius_km: f64) -> Self {
        Self { earth_radius_km }
    }

    /// Attach a distance to every candidate and sort nearest first.
    ///
    /// Candidates without an owner location (or a non-finite requester) get
    /// `distance_km = None` and sort after every located candidate. The sort is
    /// stable: equal distances, and all `None`s, keep their input order.
    pub fn rank<I>(&self, candidates: I, requester: GeoPoint) -> Vec<RankedRecord>
    where
        I: IntoIterator<Item = (CatalogRecord, Option<GeoPoint>)>,
    {
        let requester_usable = requester.latitude.is_finite() && requester.longitude.is_finite();

        let mut ranked: Vec<RankedRecord> = candidates
            .into_iter()
            .map(|(record, owner_location)| {
                let distance_km = owner_location
                    .filter(|_| requester_usable)
                    .map(|loc| {
                        round_km(haversine_km(
                            self.earth_radius_km,
                            requester.latitude,
                            requester.longitude,
                            loc.latitude,
                            loc.longitude,
                        ))
                    })
                    .filter(|d| d.is_finite());
                RankedRecord {
                    record,
                    distance_km,
                }
            })
            .collect();

        ranked.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
        ranked
    }
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
