//! # Run Tracker
//!
//! Live GPS run tracking for guided running courses.
//!
//! This library provides:
//! - Jitter-filtered distance accumulation from a raw location stream
//! - A run state machine (idle / running / paused) with pace and calories
//! - Landmark arrival detection and route-deviation alerts
//! - Start gating against the course origin
//! - Frozen run summaries for result and certificate screens
//!
//! ## Features
//!
//! - **`runtime`** (default) - tokio event loop driving ticks and location updates
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use run_tracker::{Course, GeoPoint, LocationSample, PointOfInterest, RunSession};
//!
//! let course = Course::with_endpoints(
//!     "Harbor loop",
//!     vec![GeoPoint::new(33.540, 126.560), GeoPoint::new(33.550, 126.560)],
//!     vec![PointOfInterest::new("Lighthouse", GeoPoint::new(33.545, 126.560))],
//!     "Start",
//!     "Finish",
//! ).unwrap();
//!
//! let mut session = RunSession::default();
//! session.start(course).unwrap();
//! session.location_update(LocationSample::new(33.540, 126.560));
//! session.tick();
//! session.location_update(LocationSample::new(33.5409, 126.560));
//!
//! let summary = session.end().unwrap();
//! println!("{} km at {}", summary.formatted_distance(), summary.formatted_pace());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, RunError};

// Configuration (thresholds, restart policy, geolocation options)
pub mod config;
pub use config::{GeolocationOptions, RestartPolicy, TrackerConfig};

// Geographic utilities (haversine distance, path length)
pub mod geo_utils;
pub use geo_utils::distance_km;

// Geolocation collaborator boundary
pub mod location;
pub use location::{
    LocationError, LocationSample, LocationSource, LocationUpdate, ReplayLocationSource,
    Subscription,
};

// Jitter filter
pub mod filter;
pub use filter::LocationSampleFilter;

// Course data
pub mod course;
pub use course::{Course, PointOfInterest};

// Calorie models
pub mod calories;
pub use calories::{CalorieModel, FixedRateCalories, WeightBasedCalories};

// Landmark arrival detection
pub mod proximity;
pub use proximity::ProximityDecision;

// Start gating and course path matching
pub mod route;
pub use route::{check_start, is_near_course_start, CourseIndex, CourseMatch, StartGate};

// Run state machine
pub mod session;
pub use session::{RunEvent, RunSession, RunSnapshot, RunStatus};

// Run summaries and display formatting
pub mod summary;
pub use summary::{format_elapsed, format_pace, summarize, RunSummary};

// Async event loop (timer + location stream + user commands)
#[cfg(feature = "runtime")]
pub mod driver;
#[cfg(feature = "runtime")]
pub use driver::{
    ChannelTicker, EventSink, IntervalTicker, RunCommand, RunDriver, RunDriverHandle, TickSource,
};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RunTrackerRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate in degrees.
///
/// # Example
/// ```
/// use run_tracker::GeoPoint;
/// let point = GeoPoint::new(33.4996, 126.5312); // Jeju City
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// Tests
// ============================================================================
