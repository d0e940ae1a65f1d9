//! Geolocation collaborator boundary.
//!
//! Device location arrives as a long-lived stream of [`LocationUpdate`]s.
//! A provider is anything implementing [`LocationSource`]; the consumer holds
//! a [`Subscription`] which cancels the provider when dropped, so a torn-down
//! view never leaks a running GPS watch.
//!
//! [`ReplayLocationSource`] plays back a fixed sequence and is what tests and
//! simulations use instead of real device APIs.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// One fix reported by the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub point: GeoPoint,
    /// Horizontal accuracy radius in meters, if the provider reports one
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Fix time in milliseconds since the Unix epoch, if reported
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            point: GeoPoint::new(latitude, longitude),
            accuracy_m: None,
            timestamp_ms: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

impl From<GeoPoint> for LocationSample {
    fn from(point: GeoPoint) -> Self {
        Self {
            point,
            accuracy_m: None,
            timestamp_ms: None,
        }
    }
}

/// Failure reported by the geolocation provider for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// The platform has no geolocation support at all
    Unsupported,
    Other(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission denied"),
            LocationError::PositionUnavailable => write!(f, "position unavailable"),
            LocationError::Timeout => write!(f, "timed out waiting for a position fix"),
            LocationError::Unsupported => write!(f, "geolocation is not supported"),
            LocationError::Other(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LocationError {}

/// A single item of the location stream.
pub type LocationUpdate = std::result::Result<LocationSample, LocationError>;

/// A provider of device location updates.
pub trait LocationSource {
    /// Next update, or `None` once the stream has ended.
    fn next_update(&mut self) -> Option<LocationUpdate>;

    /// Stop watching. Further calls to `next_update` return `None`.
    fn cancel(&mut self);
}

/// Owning handle on an active location watch.
///
/// Iterates the provider's updates and cancels the provider on drop.
pub struct Subscription<S: LocationSource> {
    source: S,
    cancelled: bool,
}

impl<S: LocationSource> Subscription<S> {
    pub fn new(source: S) -> Self {
        log::debug!("[Location] Subscription opened");
        Self {
            source,
            cancelled: false,
        }
    }

    /// Cancel the watch now. Dropping the subscription has the same effect.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.source.cancel();
            self.cancelled = true;
            log::debug!("[Location] Subscription cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<S: LocationSource> Iterator for Subscription<S> {
    type Item = LocationUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancelled {
            return None;
        }
        self.source.next_update()
    }
}

impl<S: LocationSource> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Deterministic provider that replays a prepared sequence of updates.
#[derive(Debug, Clone, Default)]
pub struct ReplayLocationSource {
    updates: VecDeque<LocationUpdate>,
    cancelled: bool,
}

impl ReplayLocationSource {
    pub fn new(updates: Vec<LocationUpdate>) -> Self {
        Self {
            updates: updates.into(),
            cancelled: false,
        }
    }

    /// Replay a plain path, one successful fix per point.
    pub fn from_points(points: &[GeoPoint]) -> Self {
        Self::new(points.iter().map(|p| Ok(LocationSample::from(*p))).collect())
    }

    pub fn remaining(&self) -> usize {
        if self.cancelled {
            0
        } else {
            self.updates.len()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl LocationSource for ReplayLocationSource {
    fn next_update(&mut self) -> Option<LocationUpdate> {
        if self.cancelled {
            return None;
        }
        self.updates.pop_front()
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.updates.clear();
    }
}

impl<S: LocationSource + ?Sized> LocationSource for &mut S {
    fn next_update(&mut self) -> Option<LocationUpdate> {
        (**self).next_update()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}
