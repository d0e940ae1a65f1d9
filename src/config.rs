//! Tracker configuration.
//!
//! Every threshold the pipeline uses lives here with its default. The
//! struct deserializes from JSON with missing fields falling back to the
//! defaults, so hosts only need to send what they override.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RunError};

/// What `start` does when a run is already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Discard the in-progress run and start fresh.
    #[default]
    Overwrite,
    /// Refuse with `RunError::RunAlreadyActive`.
    Reject,
}

/// Options handed to the external geolocation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    /// Request GPS-grade accuracy. Default: true
    pub enable_high_accuracy: bool,
    /// Per-fix timeout. Default: 10 000 ms
    pub timeout_ms: u32,
    /// Oldest cached fix the provider may return. Default: 60 000 ms
    pub maximum_age_ms: u32,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 60_000,
        }
    }
}

/// Configuration for the run-tracking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Movements at or below this distance count as GPS jitter.
    /// Default: 0.002 km (2 meters)
    pub min_movement_km: f64,

    /// Samples reporting a worse accuracy radius are ignored entirely.
    /// Default: None (accuracy is not checked)
    pub max_accuracy_meters: Option<f64>,

    /// Radius for landmark arrival and for clearing an arrival alert.
    /// Default: 50 meters
    pub arrival_threshold_meters: f64,

    /// How close to the course origin the runner must be to start.
    /// Default: 100 meters
    pub start_threshold_meters: f64,

    /// Distance from the course path that counts as off course.
    /// Default: 100 meters
    pub off_course_threshold_meters: f64,

    /// Calories per kilometer for the default calorie model.
    /// Default: 65 kcal/km
    pub calories_per_km: f64,

    /// Behavior of `start` during an active run. Default: Overwrite
    pub restart_policy: RestartPolicy,

    /// Passed through to the geolocation provider.
    pub geolocation: GeolocationOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_movement_km: 0.002,
            max_accuracy_meters: None,
            arrival_threshold_meters: 50.0,
            start_threshold_meters: 100.0,
            off_course_threshold_meters: 100.0,
            calories_per_km: 65.0,
            restart_policy: RestartPolicy::Overwrite,
            geolocation: GeolocationOptions::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// ```rust
    /// use run_tracker::TrackerConfig;
    ///
    /// let config = TrackerConfig::from_json(r#"{ "arrival_threshold_meters": 30.0 }"#).unwrap();
    /// assert_eq!(config.arrival_threshold_meters, 30.0);
    /// assert_eq!(config.start_threshold_meters, 100.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is finite and in range.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("min_movement_km", self.min_movement_km),
            ("calories_per_km", self.calories_per_km),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error(name, value, "must be a finite number >= 0"));
            }
        }

        let positive = [
            ("arrival_threshold_meters", self.arrival_threshold_meters),
            ("start_threshold_meters", self.start_threshold_meters),
            ("off_course_threshold_meters", self.off_course_threshold_meters),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(config_error(name, value, "must be a finite number > 0"));
            }
        }

        if let Some(accuracy) = self.max_accuracy_meters {
            if !accuracy.is_finite() || accuracy <= 0.0 {
                return Err(config_error(
                    "max_accuracy_meters",
                    accuracy,
                    "must be a finite number > 0",
                ));
            }
        }

        Ok(())
    }
}

fn config_error(field: &str, value: f64, rule: &str) -> RunError {
    RunError::ConfigError {
        message: format!("{} = {} {}", field, value, rule),
    }
}
