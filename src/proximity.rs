//! Landmark arrival detection.
//!
//! Given the runner's position and the course's points of interest, decide
//! which unvisited landmark (if any) has just been reached and whether the
//! currently shown arrival should be dismissed. This is a pure query: the
//! session applies the decision.
//!
//! Points are scanned in course order and the first unvisited one within
//! the threshold wins, even if a later one is closer.

use std::collections::HashSet;

use crate::course::PointOfInterest;
use crate::geo_utils::haversine_distance;
use crate::GeoPoint;

/// Default arrival radius in meters.
pub const DEFAULT_ARRIVAL_THRESHOLD_METERS: f64 = 50.0;

/// Outcome of one proximity evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProximityDecision<'a> {
    /// Unvisited landmark now within range
    pub newly_visited: Option<&'a PointOfInterest>,
    /// The active arrival is now out of range
    pub clear_active: bool,
}

/// Evaluate arrival and departure for one position.
///
/// A point counts as reached when its distance is within (`<=`)
/// `threshold_meters`; the active arrival clears once the distance exceeds it.
///
/// ```rust
/// use std::collections::HashSet;
/// use run_tracker::{GeoPoint, PointOfInterest, proximity::evaluate};
///
/// let pois = vec![PointOfInterest::new("Beach", GeoPoint::new(33.5, 126.5))];
/// let visited = HashSet::new();
/// let here = GeoPoint::new(33.5001, 126.5);
///
/// let decision = evaluate(&here, &pois, &visited, None, 50.0);
/// assert_eq!(decision.newly_visited.map(|p| p.name.as_str()), Some("Beach"));
/// ```
pub fn evaluate<'a>(
    position: &GeoPoint,
    pois: &'a [PointOfInterest],
    visited: &HashSet<String>,
    active_arrival: Option<&PointOfInterest>,
    threshold_meters: f64,
) -> ProximityDecision<'a> {
    let clear_active = active_arrival
        .map(|active| haversine_distance(position, &active.position) > threshold_meters)
        .unwrap_or(false);

    let newly_visited = pois.iter().find(|poi| {
        !visited.contains(&poi.name) && haversine_distance(position, &poi.position) <= threshold_meters
    });

    ProximityDecision {
        newly_visited,
        clear_active,
    }
}
