//! Course route matching.
//!
//! Two questions about where the runner is relative to the course:
//! - before a run: close enough to the origin to be allowed to start?
//! - during a run: which part of the path are they on, and have they
//!   strayed from it?
//!
//! Path queries use R-trees over the path vertices and segments in a local
//! equirectangular projection (meters around the course center), which is
//! accurate to well under a meter at course scale. Longitude is wrapped so
//! courses crossing the antimeridian project without a seam.

use rstar::primitives::{GeomWithData, Line};
use rstar::{PointDistance, RTree};
use serde::Serialize;

use crate::course::Course;
use crate::geo_utils::{compute_center, haversine_distance};
use crate::GeoPoint;

/// Default start radius in meters.
pub const DEFAULT_START_THRESHOLD_METERS: f64 = 100.0;

/// Mean Earth radius used for the local projection, matching the haversine radius.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Whether `position` is within `threshold_meters` of the course origin.
///
/// ```rust
/// use run_tracker::{GeoPoint, route::is_near_course_start};
///
/// let origin = GeoPoint::new(33.540, 126.560);
/// assert!(is_near_course_start(&GeoPoint::new(33.5405, 126.560), &origin, 100.0));
/// assert!(!is_near_course_start(&GeoPoint::new(33.550, 126.560), &origin, 100.0));
/// ```
pub fn is_near_course_start(position: &GeoPoint, course_origin: &GeoPoint, threshold_meters: f64) -> bool {
    haversine_distance(position, course_origin) <= threshold_meters
}

/// Start-gating decision shown before a run begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum StartGate {
    /// Runner is at the start point; the run may begin
    Allowed { distance_m: f64 },
    /// Runner must move to the start point first
    TooFar { distance_m: f64 },
}

impl StartGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, StartGate::Allowed { .. })
    }

    pub fn distance_m(&self) -> f64 {
        match self {
            StartGate::Allowed { distance_m } | StartGate::TooFar { distance_m } => *distance_m,
        }
    }
}

/// Evaluate the start gate for a course. Re-run on every start attempt.
pub fn check_start(position: &GeoPoint, course: &Course, threshold_meters: f64) -> StartGate {
    let distance_m = haversine_distance(position, &course.origin());
    if distance_m <= threshold_meters {
        StartGate::Allowed { distance_m }
    } else {
        StartGate::TooFar { distance_m }
    }
}

type IndexedSegment = GeomWithData<Line<[f64; 2]>, usize>;
type IndexedVertex = GeomWithData<[f64; 2], usize>;

/// Where a position sits relative to the course path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourseMatch {
    /// Index of the nearest path vertex
    pub nearest_index: usize,
    /// Distance to the nearest point on the path, in meters
    pub distance_m: f64,
}

/// Spatial index over a course path.
///
/// Vertices and segments are indexed separately: progress is reported as
/// the globally nearest vertex, while deviation is measured to the nearest
/// point on any segment.
pub struct CourseIndex {
    path: Vec<GeoPoint>,
    center_lat_cos: f64,
    center: GeoPoint,
    vertices: RTree<IndexedVertex>,
    segments: RTree<IndexedSegment>,
}

impl std::fmt::Debug for CourseIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseIndex")
            .field("points", &self.vertices.size())
            .field("segments", &self.segments.size())
            .finish()
    }
}

/// Longitude difference folded into [-180, 180].
fn wrap_longitude_delta(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

impl CourseIndex {
    /// Build the index. The path must have at least two points, which
    /// [`Course`] guarantees.
    pub fn new(path: &[GeoPoint]) -> Self {
        let center = compute_center(path).unwrap_or(GeoPoint::new(0.0, 0.0));
        let center_lat_cos = center.latitude.to_radians().cos();

        let mut index = Self {
            path: path.to_vec(),
            center_lat_cos,
            center,
            vertices: RTree::new(),
            segments: RTree::new(),
        };

        let projected: Vec<[f64; 2]> = path.iter().map(|p| index.project(p)).collect();
        index.vertices = RTree::bulk_load(
            projected
                .iter()
                .enumerate()
                .map(|(i, p)| GeomWithData::new(*p, i))
                .collect(),
        );
        index.segments = RTree::bulk_load(
            projected
                .windows(2)
                .enumerate()
                .map(|(i, w)| GeomWithData::new(Line::new(w[0], w[1]), i))
                .collect(),
        );
        index
    }

    pub fn for_course(course: &Course) -> Self {
        Self::new(course.path())
    }

    fn project(&self, p: &GeoPoint) -> [f64; 2] {
        let dlon = wrap_longitude_delta(p.longitude - self.center.longitude);
        let x = EARTH_RADIUS_M * dlon.to_radians() * self.center_lat_cos;
        let y = EARTH_RADIUS_M * (p.latitude - self.center.latitude).to_radians();
        [x, y]
    }

    /// Nearest path vertex and distance to the path, or `None` for an empty index.
    pub fn locate(&self, position: &GeoPoint) -> Option<CourseMatch> {
        let query = self.project(position);
        let vertex = self.vertices.nearest_neighbor(&query)?;
        let segment = self.segments.nearest_neighbor(&query)?;

        Some(CourseMatch {
            nearest_index: vertex.data,
            distance_m: segment.distance_2(&query).sqrt(),
        })
    }

    /// Index of the path vertex closest to `position` (0 for an empty index).
    pub fn nearest_index(&self, position: &GeoPoint) -> usize {
        self.vertices
            .nearest_neighbor(&self.project(position))
            .map(|v| v.data)
            .unwrap_or(0)
    }

    /// Distance from `position` to the path in meters.
    pub fn distance_to_course_m(&self, position: &GeoPoint) -> f64 {
        self.locate(position)
            .map(|m| m.distance_m)
            .unwrap_or(f64::INFINITY)
    }

    /// Whether `position` is farther than `threshold_meters` from the path.
    pub fn is_off_course(&self, position: &GeoPoint, threshold_meters: f64) -> bool {
        self.distance_to_course_m(position) > threshold_meters
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}
