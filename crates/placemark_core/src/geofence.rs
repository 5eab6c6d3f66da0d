//! Pure geofence math over saved places.
//!
//! # Responsibility
//! - Compute great-circle distances between coordinates.
//! - Classify saved places as inside/outside a radius.
//!
//! # Invariants
//! - Functions are side-effect free and deterministic.
//! - Membership is boundary-inclusive and monotonic in the radius.
//! - Result order follows input order.

use crate::model::place::{Coordinate, Place};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6371e3;

/// Haversine distance between `a` and `b` in meters.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Returns whether `place` lies within `radius_m` of `location`.
pub fn is_within(location: Coordinate, place: &Place, radius_m: f64) -> bool {
    distance(location, place.coordinate()) <= radius_m
}

/// Returns every saved place within `radius_m` meters of `location`.
pub fn compute_visible(location: Coordinate, saved: &[Place], radius_m: f64) -> Vec<Place> {
    saved
        .iter()
        .filter(|place| is_within(location, place, radius_m))
        .cloned()
        .collect()
}

/// Like [`compute_visible`], treating an unknown location as an empty set.
pub fn compute_visible_from(
    location: Option<Coordinate>,
    saved: &[Place],
    radius_m: f64,
) -> Vec<Place> {
    match location {
        Some(location) => compute_visible(location, saved, radius_m),
        None => Vec::new(),
    }
}
