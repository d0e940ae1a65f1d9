//! # Run Session
//!
//! The run accumulator: an explicitly owned state machine holding everything
//! about the run in progress. Hosts feed it discrete, serialized events
//! (timer ticks, location updates, user actions) and get back the
//! [`RunEvent`]s the UI should react to.
//!
//! ```text
//!          start(course)            pause()
//!   Idle ───────────────▶ Running ◀──────────▶ Paused
//!    ▲                      │        resume()    │
//!    │        end() → RunSummary (via Ended)     │
//!    └──────────────────────┴────────────────────┘
//! ```
//!
//! Operations that make no sense in the current state (a tick while paused,
//! a late location callback after `end`) are silent no-ops. Only contract
//! violations (ending a run that never started, restarting under
//! [`RestartPolicy::Reject`]) are errors.
//!
//! ## Example
//!
//! ```rust
//! use run_tracker::{Course, GeoPoint, LocationSample, RunSession, RunStatus};
//!
//! let course = Course::new(
//!     "Harbor",
//!     vec![GeoPoint::new(33.540, 126.560), GeoPoint::new(33.550, 126.560)],
//!     vec![],
//! ).unwrap();
//!
//! let mut session = RunSession::default();
//! session.start(course).unwrap();
//! session.location_update(LocationSample::new(33.540, 126.560));
//! session.tick();
//! session.location_update(LocationSample::new(33.5409, 126.560));
//! assert!((session.cumulative_distance_km() - 0.1).abs() < 0.001);
//!
//! let summary = session.end().unwrap();
//! assert_eq!(summary.elapsed_seconds, 1);
//! assert_eq!(session.status(), RunStatus::Idle);
//! ```

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::calories::{CalorieModel, FixedRateCalories};
use crate::config::{RestartPolicy, TrackerConfig};
use crate::course::{Course, PointOfInterest};
use crate::error::{Result, RunError};
use crate::filter::LocationSampleFilter;
use crate::geo_utils::distance_km;
use crate::location::{LocationSample, LocationUpdate};
use crate::proximity;
use crate::route::CourseIndex;
use crate::summary::{summarize, RunSummary};
use crate::GeoPoint;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// Transient: only observable while the summary is being produced
    Ended,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Ended => "ended",
        }
    }

    /// Running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }
}

/// Something the UI should react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        course_title: String,
    },
    Paused,
    Resumed,
    Ended {
        summary: RunSummary,
    },
    /// Accepted movement changed the running totals
    DistanceUpdated {
        distance_km: f64,
        calories_kcal: f64,
        pace_min_per_km: f64,
    },
    /// Show the "arrived" prompt for this landmark
    Arrived {
        point: PointOfInterest,
    },
    /// Dismiss the arrival prompt; the runner has moved away
    ArrivalCleared {
        point: PointOfInterest,
    },
    OffCourse {
        distance_m: f64,
    },
    BackOnCourse {
        distance_m: f64,
    },
    /// Advisory only: the run continues without a fix
    LocationUnavailable {
        reason: String,
    },
}

/// Read-only view of the running totals for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub course_title: Option<String>,
    pub elapsed_seconds: u64,
    pub distance_km: f64,
    pub calories_kcal: f64,
    pub pace_min_per_km: f64,
    pub path_points: usize,
    pub last_location: Option<GeoPoint>,
    pub visited_point_names: Vec<String>,
    pub active_arrival: Option<String>,
    pub off_course: bool,
    /// Nearest course path index to the last known position
    pub progress_index: Option<usize>,
}

/// Minutes per kilometer, or 0 when no distance has been covered.
pub fn pace_min_per_km(elapsed_seconds: u64, distance_km: f64) -> f64 {
    if distance_km > 0.0 {
        elapsed_seconds as f64 / 60.0 / distance_km
    } else {
        0.0
    }
}

/// The in-progress run.
#[derive(Debug)]
pub struct RunSession {
    // Configuration
    config: TrackerConfig,
    filter: LocationSampleFilter,
    calorie_model: Box<dyn CalorieModel>,

    // Run state
    status: RunStatus,
    course: Option<Course>,
    course_index: Option<CourseIndex>,
    elapsed_seconds: u64,
    cumulative_distance_km: f64,
    cumulative_calories_kcal: f64,
    average_pace_min_per_km: f64,
    recorded_path: Vec<GeoPoint>,
    last_accepted_location: Option<GeoPoint>,
    samples_received: u64,

    // Landmarks and deviation
    visited_point_names: HashSet<String>,
    visit_order: Vec<String>,
    active_arrival: Option<PointOfInterest>,
    off_course: bool,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::build(TrackerConfig::default())
    }
}

impl RunSession {
    /// Create an idle session with a validated configuration.
    ///
    /// The calorie model defaults to a fixed rate of
    /// `config.calories_per_km`.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: TrackerConfig) -> Self {
        Self {
            filter: LocationSampleFilter::from_config(&config),
            calorie_model: Box::new(FixedRateCalories::new(config.calories_per_km)),
            config,
            status: RunStatus::Idle,
            course: None,
            course_index: None,
            elapsed_seconds: 0,
            cumulative_distance_km: 0.0,
            cumulative_calories_kcal: 0.0,
            average_pace_min_per_km: 0.0,
            recorded_path: Vec::new(),
            last_accepted_location: None,
            samples_received: 0,
            visited_point_names: HashSet::new(),
            visit_order: Vec::new(),
            active_arrival: None,
            off_course: false,
        }
    }

    /// Replace the calorie model.
    pub fn with_calorie_model(mut self, model: Box<dyn CalorieModel>) -> Self {
        self.calorie_model = model;
        self
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Bind a course and begin running with all counters zeroed.
    ///
    /// Starting while a run is active either discards it
    /// ([`RestartPolicy::Overwrite`]) or fails with
    /// [`RunError::RunAlreadyActive`] ([`RestartPolicy::Reject`]).
    pub fn start(&mut self, course: Course) -> Result<Vec<RunEvent>> {
        if self.status.is_active() {
            match self.config.restart_policy {
                RestartPolicy::Reject => {
                    warn!(
                        "[RunSession] Refusing to start '{}': run already {}",
                        course.title(),
                        self.status.as_str()
                    );
                    return Err(RunError::RunAlreadyActive {
                        status: self.status.as_str().to_string(),
                    });
                }
                RestartPolicy::Overwrite => {
                    warn!(
                        "[RunSession] Discarding {} run ({:.3} km, {}s) to start '{}'",
                        self.status.as_str(),
                        self.cumulative_distance_km,
                        self.elapsed_seconds,
                        course.title()
                    );
                }
            }
        }

        self.reset();
        info!(
            "[RunSession] Started '{}' ({} path points, {} points of interest)",
            course.title(),
            course.path().len(),
            course.points_of_interest().len()
        );

        let course_title = course.title().to_string();
        self.course_index = Some(CourseIndex::for_course(&course));
        self.course = Some(course);
        self.status = RunStatus::Running;

        Ok(vec![RunEvent::Started { course_title }])
    }

    /// Suspend time and distance accumulation. No-op unless running.
    pub fn pause(&mut self) -> Vec<RunEvent> {
        if self.status != RunStatus::Running {
            return Vec::new();
        }
        self.status = RunStatus::Paused;
        info!("[RunSession] Paused at {}s, {:.3} km", self.elapsed_seconds, self.cumulative_distance_km);
        vec![RunEvent::Paused]
    }

    /// Continue a paused run. No-op unless paused.
    pub fn resume(&mut self) -> Vec<RunEvent> {
        if self.status != RunStatus::Paused {
            return Vec::new();
        }
        self.status = RunStatus::Running;
        info!("[RunSession] Resumed");
        vec![RunEvent::Resumed]
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&mut self) -> Vec<RunEvent> {
        match self.status {
            RunStatus::Running => self.pause(),
            RunStatus::Paused => self.resume(),
            RunStatus::Idle | RunStatus::Ended => Vec::new(),
        }
    }

    /// One second of running time. Ignored unless running.
    pub fn tick(&mut self) {
        if self.status == RunStatus::Running {
            self.elapsed_seconds += 1;
        }
    }

    /// Finish the run: freeze a [`RunSummary`] and return to idle.
    pub fn end(&mut self) -> Result<RunSummary> {
        if !self.status.is_active() {
            warn!("[RunSession] end() called with no run in progress");
            return Err(RunError::NoActiveRun {
                operation: "end the run".to_string(),
            });
        }

        self.status = RunStatus::Ended;
        let summary = summarize(self)?;
        info!(
            "[RunSession] Ended '{}': {:.3} km in {}s",
            summary.course_title, summary.total_distance_km, summary.elapsed_seconds
        );
        self.reset();
        Ok(summary)
    }

    /// Clear the arrival prompt without leaving the landmark (alert closed
    /// or photo taken). The landmark stays visited.
    pub fn dismiss_arrival(&mut self) -> Option<PointOfInterest> {
        self.active_arrival.take()
    }

    fn reset(&mut self) {
        self.status = RunStatus::Idle;
        self.course = None;
        self.course_index = None;
        self.elapsed_seconds = 0;
        self.cumulative_distance_km = 0.0;
        self.cumulative_calories_kcal = 0.0;
        self.average_pace_min_per_km = 0.0;
        self.recorded_path = Vec::new();
        self.last_accepted_location = None;
        self.samples_received = 0;
        self.visited_point_names.clear();
        self.visit_order.clear();
        self.active_arrival = None;
        self.off_course = false;
    }

    // ========================================================================
    // Location handling
    // ========================================================================

    /// Apply one item from the geolocation stream.
    ///
    /// Provider errors never interrupt the run; they become a
    /// [`RunEvent::LocationUnavailable`] advisory.
    pub fn apply_update(&mut self, update: LocationUpdate) -> Vec<RunEvent> {
        match update {
            Ok(sample) => self.location_update(sample),
            Err(err) => {
                if !self.status.is_active() {
                    return Vec::new();
                }
                warn!("[RunSession] No location this cycle: {}", err);
                vec![RunEvent::LocationUnavailable {
                    reason: err.to_string(),
                }]
            }
        }
    }

    /// Process a location fix.
    ///
    /// While running, the fix is always appended to the recorded path and
    /// adds to the distance when the jitter filter accepts the movement from
    /// the previous fix. While paused, nothing accumulates. In both states
    /// the fix becomes the last known position and landmark arrival is
    /// evaluated. Ignored when idle.
    pub fn location_update(&mut self, sample: LocationSample) -> Vec<RunEvent> {
        if !self.status.is_active() {
            return Vec::new();
        }
        if !self.filter.is_usable(&sample) {
            debug!(
                "[RunSession] Dropping unusable fix ({}, {}) accuracy={:?}",
                sample.point.latitude, sample.point.longitude, sample.accuracy_m
            );
            return Vec::new();
        }

        let raw = sample.point;
        self.samples_received += 1;
        let mut events = Vec::new();

        if self.status == RunStatus::Running {
            self.recorded_path.push(raw);

            if let Some(prev) = self.last_accepted_location {
                if self.filter.accept(Some(&prev), &raw) {
                    let d = distance_km(&prev, &raw);
                    self.cumulative_distance_km += d;
                    self.cumulative_calories_kcal =
                        self.calorie_model.calories_for(self.cumulative_distance_km);
                    if self.cumulative_distance_km > 0.0 {
                        self.average_pace_min_per_km =
                            pace_min_per_km(self.elapsed_seconds, self.cumulative_distance_km);
                    }
                    debug!(
                        "[RunSession] +{:.4} km (total {:.4} km)",
                        d, self.cumulative_distance_km
                    );
                    events.push(RunEvent::DistanceUpdated {
                        distance_km: self.cumulative_distance_km,
                        calories_kcal: self.cumulative_calories_kcal,
                        pace_min_per_km: self.average_pace_min_per_km,
                    });
                } else {
                    debug!("[RunSession] Jitter ignored");
                }
            }
        }

        self.last_accepted_location = Some(raw);

        self.detect_arrivals(&raw, &mut events);
        if self.status == RunStatus::Running {
            self.detect_deviation(&raw, &mut events);
        }

        events
    }

    fn detect_arrivals(&mut self, position: &GeoPoint, events: &mut Vec<RunEvent>) {
        let Some(course) = self.course.as_ref() else {
            return;
        };

        let decision = proximity::evaluate(
            position,
            course.points_of_interest(),
            &self.visited_point_names,
            self.active_arrival.as_ref(),
            self.config.arrival_threshold_meters,
        );
        let newly_visited = decision.newly_visited.cloned();

        if decision.clear_active {
            if let Some(point) = self.active_arrival.take() {
                debug!("[RunSession] Left '{}'", point.name);
                events.push(RunEvent::ArrivalCleared { point });
            }
        }

        if let Some(point) = newly_visited {
            info!("[RunSession] Arrived at '{}'", point.name);
            self.visited_point_names.insert(point.name.clone());
            self.visit_order.push(point.name.clone());
            self.active_arrival = Some(point.clone());
            events.push(RunEvent::Arrived { point });
        }
    }

    fn detect_deviation(&mut self, position: &GeoPoint, events: &mut Vec<RunEvent>) {
        let Some(index) = self.course_index.as_ref() else {
            return;
        };

        let distance_m = index.distance_to_course_m(position);
        let threshold = self.config.off_course_threshold_meters;

        if !self.off_course && distance_m > threshold {
            self.off_course = true;
            info!("[RunSession] Off course by {:.0} m", distance_m);
            events.push(RunEvent::OffCourse { distance_m });
        } else if self.off_course && distance_m <= threshold {
            self.off_course = false;
            info!("[RunSession] Back on course ({:.0} m)", distance_m);
            events.push(RunEvent::BackOnCourse { distance_m });
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn cumulative_distance_km(&self) -> f64 {
        self.cumulative_distance_km
    }

    pub fn cumulative_calories_kcal(&self) -> f64 {
        self.cumulative_calories_kcal
    }

    pub fn average_pace_min_per_km(&self) -> f64 {
        self.average_pace_min_per_km
    }

    pub fn recorded_path(&self) -> &[GeoPoint] {
        &self.recorded_path
    }

    pub fn last_accepted_location(&self) -> Option<GeoPoint> {
        self.last_accepted_location
    }

    /// Number of usable fixes processed during this run.
    pub fn samples_received(&self) -> u64 {
        self.samples_received
    }

    pub fn visited_point_names(&self) -> &HashSet<String> {
        &self.visited_point_names
    }

    /// Visited landmark names in the order they were reached.
    pub fn visit_order(&self) -> &[String] {
        &self.visit_order
    }

    pub fn active_arrival(&self) -> Option<&PointOfInterest> {
        self.active_arrival.as_ref()
    }

    pub fn is_off_course(&self) -> bool {
        self.off_course
    }

    pub fn calorie_model(&self) -> &dyn CalorieModel {
        self.calorie_model.as_ref()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let progress_index = match (&self.course_index, &self.last_accepted_location) {
            (Some(index), Some(location)) => Some(index.nearest_index(location)),
            _ => None,
        };

        RunSnapshot {
            status: self.status,
            course_title: self.course.as_ref().map(|c| c.title().to_string()),
            elapsed_seconds: self.elapsed_seconds,
            distance_km: self.cumulative_distance_km,
            calories_kcal: self.cumulative_calories_kcal,
            pace_min_per_km: self.average_pace_min_per_km,
            path_points: self.recorded_path.len(),
            last_location: self.last_accepted_location,
            visited_point_names: self.visit_order.clone(),
            active_arrival: self.active_arrival.as_ref().map(|p| p.name.clone()),
            off_course: self.off_course,
            progress_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calories::WeightBasedCalories;
    use crate::location::LocationError;

    fn course() -> Course {
        Course::with_endpoints(
            "Harbor",
            vec![
                GeoPoint::new(33.540, 126.560),
                GeoPoint::new(33.545, 126.560),
                GeoPoint::new(33.550, 126.560),
            ],
            vec![PointOfInterest::new("Lighthouse", GeoPoint::new(33.545, 126.560))],
            "Start",
            "Finish",
        )
        .unwrap()
    }

    fn running() -> RunSession {
        let mut session = RunSession::default();
        session.start(course()).unwrap();
        session
    }

    #[test]
    fn test_start_zeroes_state() {
        let mut session = running();
        assert_eq!(session.status(), RunStatus::Running);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.cumulative_distance_km(), 0.0);
        assert!(session.recorded_path().is_empty());
        assert!(session.last_accepted_location().is_none());

        let events = session.pause();
        assert_eq!(events, vec![RunEvent::Paused]);
    }

    #[test]
    fn test_tick_only_while_running() {
        let mut session = RunSession::default();
        session.tick();
        assert_eq!(session.elapsed_seconds(), 0);

        session.start(course()).unwrap();
        for _ in 0..5 {
            session.tick();
        }
        assert_eq!(session.elapsed_seconds(), 5);

        session.pause();
        for _ in 0..3 {
            session.tick();
        }
        assert_eq!(session.elapsed_seconds(), 5);

        session.resume();
        session.tick();
        assert_eq!(session.elapsed_seconds(), 6);
    }

    #[test]
    fn test_baseline_then_distance() {
        let mut session = running();
        let events = session.location_update(LocationSample::new(33.540, 126.560));
        assert_eq!(session.cumulative_distance_km(), 0.0);
        assert!(!events.iter().any(|e| matches!(e, RunEvent::DistanceUpdated { .. })));

        session.location_update(LocationSample::new(33.5409, 126.560));
        let d = session.cumulative_distance_km();
        assert!((d - 0.1).abs() <= 0.001, "got {}", d);
        assert!((session.cumulative_calories_kcal() - 6.5).abs() <= 0.065);
        assert_eq!(session.recorded_path().len(), 2);
    }

    #[test]
    fn test_jitter_recorded_but_not_counted() {
        let mut session = running();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.location_update(LocationSample::new(33.54001, 126.560));
        assert_eq!(session.cumulative_distance_km(), 0.0);
        assert_eq!(session.recorded_path().len(), 2);
        assert_eq!(session.last_accepted_location(), Some(GeoPoint::new(33.54001, 126.560)));
    }

    #[test]
    fn test_pause_freezes_distance() {
        let mut session = running();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.pause();

        session.location_update(LocationSample::new(33.542, 126.560));
        assert_eq!(session.cumulative_distance_km(), 0.0);
        assert_eq!(session.recorded_path().len(), 1);

        // Movement made while paused is not counted after resuming
        session.resume();
        session.location_update(LocationSample::new(33.542, 126.560));
        assert_eq!(session.cumulative_distance_km(), 0.0);
    }

    #[test]
    fn test_pace_uses_elapsed_at_update() {
        let mut session = running();
        for _ in 0..600 {
            session.tick();
        }
        session.location_update(LocationSample::new(33.540, 126.560));
        // ~2 km north
        session.location_update(LocationSample::new(33.540 + 0.0179864, 126.560));
        let pace = session.average_pace_min_per_km();
        assert!((pace - 5.0).abs() < 0.01, "got {}", pace);
    }

    #[test]
    fn test_pace_helper() {
        assert_eq!(pace_min_per_km(600, 2.0), 5.0);
        assert_eq!(pace_min_per_km(600, 0.0), 0.0);
    }

    #[test]
    fn test_idle_operations_are_noops() {
        let mut session = RunSession::default();
        assert!(session.location_update(LocationSample::new(33.5, 126.5)).is_empty());
        assert!(session.apply_update(Err(LocationError::Timeout)).is_empty());
        assert!(session.pause().is_empty());
        assert!(session.resume().is_empty());
        assert!(session.toggle_pause().is_empty());
        assert!(session.recorded_path().is_empty());
        assert!(matches!(session.end(), Err(RunError::NoActiveRun { .. })));
    }

    #[test]
    fn test_redundant_pause_is_noop() {
        let mut session = running();
        assert_eq!(session.pause(), vec![RunEvent::Paused]);
        assert!(session.pause().is_empty());
        assert_eq!(session.status(), RunStatus::Paused);
        assert_eq!(session.toggle_pause(), vec![RunEvent::Resumed]);
    }

    #[test]
    fn test_location_error_is_advisory() {
        let mut session = running();
        session.tick();
        let events = session.apply_update(Err(LocationError::PositionUnavailable));
        assert!(matches!(events[0], RunEvent::LocationUnavailable { .. }));
        assert_eq!(session.status(), RunStatus::Running);
        session.tick();
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn test_arrival_once_then_cleared() {
        let mut session = running();
        let events = session.location_update(LocationSample::new(33.540, 126.560));
        assert!(events.contains(&RunEvent::Arrived {
            point: PointOfInterest::new("Start", GeoPoint::new(33.540, 126.560)),
        }));
        assert_eq!(session.active_arrival().map(|p| p.name.as_str()), Some("Start"));

        // Move ~220 m away: alert clears
        let events = session.location_update(LocationSample::new(33.542, 126.560));
        assert!(events.iter().any(|e| matches!(e, RunEvent::ArrivalCleared { .. })));
        assert!(session.active_arrival().is_none());

        // Come back: no second arrival
        let events = session.location_update(LocationSample::new(33.540, 126.560));
        assert!(!events.iter().any(|e| matches!(e, RunEvent::Arrived { .. })));
        assert_eq!(session.visit_order(), ["Start".to_string()]);
    }

    #[test]
    fn test_dismiss_arrival_keeps_visit() {
        let mut session = running();
        session.location_update(LocationSample::new(33.545, 126.560));
        let dismissed = session.dismiss_arrival().unwrap();
        assert_eq!(dismissed.name, "Lighthouse");
        assert!(session.active_arrival().is_none());
        assert!(session.visited_point_names().contains("Lighthouse"));

        let events = session.location_update(LocationSample::new(33.5451, 126.560));
        assert!(!events.iter().any(|e| matches!(e, RunEvent::Arrived { .. })));
    }

    #[test]
    fn test_off_course_and_back() {
        let mut session = running();
        session.location_update(LocationSample::new(33.540, 126.560));

        // ~280 m east of the path
        let events = session.location_update(LocationSample::new(33.543, 126.563));
        assert!(events.iter().any(|e| matches!(e, RunEvent::OffCourse { .. })));
        assert!(session.is_off_course());

        // Still off: no repeat
        let events = session.location_update(LocationSample::new(33.5435, 126.563));
        assert!(!events.iter().any(|e| matches!(e, RunEvent::OffCourse { .. })));

        let events = session.location_update(LocationSample::new(33.544, 126.560));
        assert!(events.iter().any(|e| matches!(e, RunEvent::BackOnCourse { .. })));
        assert!(!session.is_off_course());
    }

    #[test]
    fn test_restart_overwrites_by_default() {
        let mut session = running();
        session.tick();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.start(course()).unwrap();
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(session.recorded_path().is_empty());
        assert!(session.visited_point_names().is_empty());
    }

    #[test]
    fn test_restart_rejected_when_configured() {
        let config = TrackerConfig {
            restart_policy: RestartPolicy::Reject,
            ..Default::default()
        };
        let mut session = RunSession::new(config).unwrap();
        session.start(course()).unwrap();
        session.tick();

        let err = session.start(course()).unwrap_err();
        assert_eq!(
            err,
            RunError::RunAlreadyActive {
                status: "running".to_string()
            }
        );
        assert_eq!(session.elapsed_seconds(), 1);
    }

    #[test]
    fn test_end_resets_and_late_callbacks_are_noops() {
        let mut session = running();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.tick();
        session.location_update(LocationSample::new(33.541, 126.560));
        let summary = session.end().unwrap();
        assert!(summary.total_distance_km > 0.1);

        assert_eq!(session.status(), RunStatus::Idle);
        assert!(session.course().is_none());
        assert!(session.recorded_path().is_empty());
        assert!(session.visited_point_names().is_empty());

        session.location_update(LocationSample::new(33.545, 126.560));
        session.tick();
        assert!(session.recorded_path().is_empty());
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn test_custom_calorie_model() {
        let mut session =
            RunSession::default().with_calorie_model(Box::new(WeightBasedCalories::new(60.0)));
        session.start(course()).unwrap();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.location_update(LocationSample::new(33.5409, 126.560));
        let expected = session.cumulative_distance_km() * 60.0 * WeightBasedCalories::KCAL_PER_KG_KM;
        assert!((session.cumulative_calories_kcal() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot() {
        let mut session = running();
        session.location_update(LocationSample::new(33.540, 126.560));
        session.location_update(LocationSample::new(33.5449, 126.560));
        let snap = session.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.course_title.as_deref(), Some("Harbor"));
        assert_eq!(snap.path_points, 2);
        assert_eq!(snap.progress_index, Some(1));
        assert_eq!(snap.active_arrival.as_deref(), Some("Lighthouse"));
        assert_eq!(snap.visited_point_names, vec!["Start", "Lighthouse"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TrackerConfig {
            arrival_threshold_meters: -5.0,
            ..Default::default()
        };
        assert!(RunSession::new(config).is_err());
    }
}
