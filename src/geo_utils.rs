//! # Geographic Utilities
//!
//! Great-circle distance helpers used by every stage of the tracking pipeline.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points, in meters |
//! | [`distance_km`] | Same distance in kilometers (the unit run totals use) |
//! | [`polyline_length_km`] | Total length of a path in kilometers |
//! | [`compute_center`] | Mean point of a path |
//!
//! ## Example
//!
//! ```rust
//! use run_tracker::{GeoPoint, geo_utils};
//!
//! let a = GeoPoint::new(33.540, 126.560);
//! let b = GeoPoint::new(33.5409, 126.560);
//!
//! let km = geo_utils::distance_km(&a, &b);
//! assert!((km - 0.1).abs() < 0.001);
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula treats the Earth as a sphere (mean radius ~6371 km).
//! Inputs are WGS84 degrees; validity is the caller's responsibility.

use geo::{Distance, Haversine, Point};

use crate::GeoPoint;

/// Great-circle distance between two points in meters.
///
/// Symmetric, and zero for identical points.
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Great-circle distance between two points in kilometers.
///
/// ```rust
/// use run_tracker::{GeoPoint, geo_utils::distance_km};
///
/// let p = GeoPoint::new(33.5, 126.5);
/// assert_eq!(distance_km(&p, &p), 0.0);
/// ```
#[inline]
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a, b) / 1000.0
}

/// Total length of a path in kilometers. Empty or single-point paths are 0.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points.windows(2).map(|w| distance_km(&w[0], &w[1])).sum()
}

/// Mean point of a path. Returns `None` for an empty slice.
///
/// Longitude is a circular mean, so a path crossing the antimeridian is
/// centered near 180 degrees rather than near 0.
pub fn compute_center(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let (sin_sum, cos_sum) = points.iter().fold((0.0, 0.0), |(s, c), p| {
        let lng = p.longitude.to_radians();
        (s + lng.sin(), c + lng.cos())
    });
    let lng = sin_sum.atan2(cos_sum).to_degrees();
    Some(GeoPoint::new(lat, lng))
}
