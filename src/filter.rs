//! Location sample filtering.
//!
//! GPS fixes wander by a few meters even when the device is still. The
//! filter decides whether a new fix is real movement that should count
//! toward accumulated distance. It gates distance only; the caller still
//! records the fix as the latest known position.

use crate::config::TrackerConfig;
use crate::geo_utils::distance_km;
use crate::location::LocationSample;
use crate::GeoPoint;

/// Jitter filter for distance accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSampleFilter {
    /// Movements must exceed this to count (km)
    pub min_movement_km: f64,
    /// Fixes with a larger reported accuracy radius are unusable (m)
    pub max_accuracy_meters: Option<f64>,
}

impl Default for LocationSampleFilter {
    fn default() -> Self {
        Self {
            min_movement_km: 0.002,
            max_accuracy_meters: None,
        }
    }
}

impl LocationSampleFilter {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            min_movement_km: config.min_movement_km,
            max_accuracy_meters: config.max_accuracy_meters,
        }
    }

    /// Whether moving from `previous` to `candidate` counts as real movement.
    ///
    /// With no previous point the candidate is the baseline and is always
    /// accepted. Otherwise the great-circle distance must exceed
    /// `min_movement_km`.
    ///
    /// ```rust
    /// use run_tracker::{GeoPoint, LocationSampleFilter};
    ///
    /// let filter = LocationSampleFilter::default();
    /// let here = GeoPoint::new(33.0, 126.0);
    /// assert!(filter.accept(None, &here));
    /// assert!(!filter.accept(Some(&here), &GeoPoint::new(33.00001, 126.0)));
    /// ```
    pub fn accept(&self, previous: Option<&GeoPoint>, candidate: &GeoPoint) -> bool {
        match previous {
            None => true,
            Some(prev) => distance_km(prev, candidate) > self.min_movement_km,
        }
    }

    /// Whether a fix is usable at all. Invalid coordinates and fixes worse
    /// than the configured accuracy are dropped as "no update this cycle".
    pub fn is_usable(&self, sample: &LocationSample) -> bool {
        if !sample.point.is_valid() {
            return false;
        }
        match (self.max_accuracy_meters, sample.accuracy_m) {
            (Some(max), Some(accuracy)) => accuracy <= max,
            _ => true,
        }
    }
}
