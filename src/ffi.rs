//! FFI bindings for mobile platforms (iOS/Android).
//!
//! Exposes [`RunTrackerHandle`], an owned run session that Kotlin and Swift
//! hold for the lifetime of a run screen. The mobile side owns the timer
//! and the geolocation watch and forwards them here; every call returns
//! JSON so the UI can render events, snapshots and summaries without
//! mirroring Rust types.
//!
//! Failures are returned as `{"error": "..."}` rather than thrown.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde::Serialize;

use crate::location::{LocationError, LocationSample, LocationUpdate};
use crate::route::check_start;
use crate::session::{RunEvent, RunSession};
use crate::summary::{format_elapsed, format_pace};
use crate::{init_logging, Course, GeoPoint, RunError, TrackerConfig};

// ============================================================================
// JSON helpers
// ============================================================================

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        warn!("[RunTrackerFfi] Failed to serialize response: {}", err);
        "{}".to_string()
    })
}

fn error_json(err: &RunError) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

fn events_json(events: &[RunEvent]) -> String {
    serde_json::to_string(events).unwrap_or_else(|err| {
        warn!("[RunTrackerFfi] Failed to serialize {} events: {}", events.len(), err);
        "[]".to_string()
    })
}

fn parse_course(course_json: &str) -> Result<Course, RunError> {
    serde_json::from_str(course_json).map_err(RunError::from)
}

/// Map a W3C geolocation error code to a [`LocationError`].
fn location_error_from_code(code: u32, message: String) -> LocationError {
    match code {
        1 => LocationError::PermissionDenied,
        2 => LocationError::PositionUnavailable,
        3 => LocationError::Timeout,
        _ if message.is_empty() => LocationError::Unsupported,
        _ => LocationError::Other(message),
    }
}

// ============================================================================
// Tracker Handle
// ============================================================================

/// One run session shared between the platform timer, the geolocation
/// callback and the UI.
#[derive(uniffi::Object)]
pub struct RunTrackerHandle {
    session: Mutex<RunSession>,
}

impl RunTrackerHandle {
    fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RunSession) -> R,
    {
        // A panic mid-update leaves plain data behind; keep serving it
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut session)
    }
}

#[uniffi::export]
impl RunTrackerHandle {
    /// Create a tracker with the default configuration.
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        init_logging();
        info!("[RunTrackerFfi] Tracker created");
        Arc::new(Self {
            session: Mutex::new(RunSession::default()),
        })
    }

    /// Replace the configuration. Only allowed while no run is active.
    ///
    /// Returns `{"ok": true}` or an error object.
    pub fn configure(&self, config_json: String) -> String {
        let config = match TrackerConfig::from_json(&config_json) {
            Ok(config) => config,
            Err(err) => {
                warn!("[RunTrackerFfi] Rejected config: {}", err);
                return error_json(&err);
            }
        };

        self.with_session(|session| {
            if session.status().is_active() {
                return error_json(&RunError::RunAlreadyActive {
                    status: session.status().as_str().to_string(),
                });
            }
            match RunSession::new(config) {
                Ok(fresh) => {
                    *session = fresh;
                    info!("[RunTrackerFfi] Configuration updated");
                    serde_json::json!({ "ok": true }).to_string()
                }
                Err(err) => error_json(&err),
            }
        })
    }

    /// Current configuration as JSON.
    pub fn config_json(&self) -> String {
        self.with_session(|session| to_json(session.config()))
    }

    /// Start gate for a course: `{"gate": "allowed"|"too_far", "distance_m": ..}`.
    pub fn check_start(&self, latitude: f64, longitude: f64, course_json: String) -> String {
        let course = match parse_course(&course_json) {
            Ok(course) => course,
            Err(err) => return error_json(&err),
        };
        let threshold = self.with_session(|session| session.config().start_threshold_meters);
        let gate = check_start(&GeoPoint::new(latitude, longitude), &course, threshold);
        info!(
            "[RunTrackerFfi] Start gate for '{}': {:.0}m (allowed={})",
            course.title(),
            gate.distance_m(),
            gate.is_allowed()
        );
        to_json(&gate)
    }

    /// Begin a run on a course given as JSON. Returns the emitted events.
    pub fn start(&self, course_json: String) -> String {
        let course = match parse_course(&course_json) {
            Ok(course) => course,
            Err(err) => return error_json(&err),
        };
        info!(
            "[RunTrackerFfi] Starting '{}' ({} path points, {} landmarks)",
            course.title(),
            course.path().len(),
            course.points_of_interest().len()
        );
        self.with_session(|session| match session.start(course) {
            Ok(events) => events_json(&events),
            Err(err) => error_json(&err),
        })
    }

    pub fn pause(&self) -> String {
        self.with_session(|session| events_json(&session.pause()))
    }

    pub fn resume(&self) -> String {
        self.with_session(|session| events_json(&session.resume()))
    }

    pub fn toggle_pause(&self) -> String {
        self.with_session(|session| events_json(&session.toggle_pause()))
    }

    /// One-second timer tick from the platform scheduler.
    pub fn tick(&self) {
        self.with_session(|session| session.tick());
    }

    /// Close the landmark arrival prompt.
    pub fn dismiss_arrival(&self) -> String {
        self.with_session(|session| {
            let events: Vec<RunEvent> = session
                .dismiss_arrival()
                .map(|point| RunEvent::ArrivalCleared { point })
                .into_iter()
                .collect();
            events_json(&events)
        })
    }

    /// End the run and return its summary.
    pub fn end(&self) -> String {
        self.with_session(|session| match session.end() {
            Ok(summary) => {
                info!(
                    "[RunTrackerFfi] Run ended: {:.2}km in {}s",
                    summary.total_distance_km, summary.elapsed_seconds
                );
                to_json(&summary)
            }
            Err(err) => error_json(&err),
        })
    }

    /// Forward a position fix. Accuracy and timestamp may be absent.
    pub fn location_update(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy_m: Option<f64>,
        timestamp_ms: Option<i64>,
    ) -> String {
        let sample = LocationSample {
            point: GeoPoint::new(latitude, longitude),
            accuracy_m,
            timestamp_ms,
        };
        self.with_session(|session| events_json(&session.location_update(sample)))
    }

    /// Forward a geolocation failure (W3C codes: 1 denied, 2 unavailable, 3 timeout).
    pub fn location_error(&self, code: u32, message: String) -> String {
        let update: LocationUpdate = Err(location_error_from_code(code, message));
        self.with_session(|session| events_json(&session.apply_update(update)))
    }

    /// Live run state for the running screen.
    pub fn snapshot_json(&self) -> String {
        self.with_session(|session| to_json(&session.snapshot()))
    }
}

// ============================================================================
// Formatting
// ============================================================================

#[uniffi::export]
pub fn ffi_format_pace(pace_min_per_km: f64) -> String {
    format_pace(pace_min_per_km)
}

#[uniffi::export]
pub fn ffi_format_elapsed(seconds: u64) -> String {
    format_elapsed(seconds)
}
