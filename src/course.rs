//! Course data bound to a run.
//!
//! A course is an already-parsed route: the ordered path from origin to
//! destination plus the named points of interest along it. It is
//! validated once when constructed and is immutable afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, RunError};
use crate::geo_utils::polyline_length_km;
use crate::GeoPoint;

/// A named landmark on or near a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Unique within a course
    pub name: String,
    pub position: GeoPoint,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// A validated running course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    title: String,
    path: Vec<GeoPoint>,
    points_of_interest: Vec<PointOfInterest>,
    total_distance_km: f64,
}

/// Unvalidated course as it arrives from a course bundle.
#[derive(Debug, Clone, Deserialize)]
struct RawCourse {
    title: String,
    path: Vec<GeoPoint>,
    #[serde(default)]
    points_of_interest: Vec<PointOfInterest>,
}

impl<'de> Deserialize<'de> for Course {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCourse::deserialize(deserializer)?;
        Course::new(raw.title, raw.path, raw.points_of_interest).map_err(serde::de::Error::custom)
    }
}

impl Course {
    /// Minimum path length: an origin and a destination.
    pub const MIN_PATH_POINTS: usize = 2;

    /// Build a course, rejecting short paths, invalid coordinates and
    /// duplicate point-of-interest names.
    pub fn new(
        title: impl Into<String>,
        path: Vec<GeoPoint>,
        points_of_interest: Vec<PointOfInterest>,
    ) -> Result<Self> {
        let title = title.into();

        if path.len() < Self::MIN_PATH_POINTS {
            return Err(RunError::InsufficientPoints {
                course: title,
                point_count: path.len(),
                minimum_required: Self::MIN_PATH_POINTS,
            });
        }

        if let Some((i, p)) = path.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(RunError::InvalidCoordinates {
                course: title,
                message: format!("path point {} is ({}, {})", i, p.latitude, p.longitude),
            });
        }

        let mut names = HashSet::new();
        for poi in &points_of_interest {
            if !poi.position.is_valid() {
                return Err(RunError::InvalidCoordinates {
                    course: title,
                    message: format!(
                        "point of interest '{}' is ({}, {})",
                        poi.name, poi.position.latitude, poi.position.longitude
                    ),
                });
            }
            if !names.insert(poi.name.as_str()) {
                return Err(RunError::DuplicatePointOfInterest {
                    course: title,
                    name: poi.name.clone(),
                });
            }
        }

        let total_distance_km = polyline_length_km(&path);

        Ok(Self {
            title,
            path,
            points_of_interest,
            total_distance_km,
        })
    }

    /// Build a course whose points of interest start with the origin and end
    /// with the destination, with the intermediate spots in between.
    pub fn with_endpoints(
        title: impl Into<String>,
        path: Vec<GeoPoint>,
        spots: Vec<PointOfInterest>,
        origin_name: &str,
        destination_name: &str,
    ) -> Result<Self> {
        let title = title.into();
        let point_count = path.len();
        let origin = path
            .first()
            .copied()
            .ok_or_insufficient_points(&title, point_count, Self::MIN_PATH_POINTS)?;
        let destination = path
            .last()
            .copied()
            .ok_or_insufficient_points(&title, point_count, Self::MIN_PATH_POINTS)?;

        let mut pois = Vec::with_capacity(spots.len() + 2);
        pois.push(PointOfInterest::new(origin_name, origin));
        pois.extend(spots);
        pois.push(PointOfInterest::new(destination_name, destination));

        Self::new(title, path, pois)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn points_of_interest(&self) -> &[PointOfInterest] {
        &self.points_of_interest
    }

    pub fn origin(&self) -> GeoPoint {
        self.path[0]
    }

    pub fn destination(&self) -> GeoPoint {
        self.path[self.path.len() - 1]
    }

    /// Length of the course path in kilometers.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn has_point_of_interest(&self, name: &str) -> bool {
        self.points_of_interest.iter().any(|p| p.name == name)
    }
}
