//! Unified error handling for the run-tracker library.
//!
//! Only caller contract violations are errors. Geolocation failures are
//! absorbed at the collaborator boundary and surface as advisory events,
//! and operations on an idle session are silent no-ops.

use std::fmt;

/// Unified error type for run-tracker operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// Course path has too few points to define an origin and destination
    InsufficientPoints {
        course: String,
        point_count: usize,
        minimum_required: usize,
    },
    /// Course contains a point outside the valid latitude/longitude range
    InvalidCoordinates { course: String, message: String },
    /// Two points of interest share a name
    DuplicatePointOfInterest { course: String, name: String },
    /// Operation requires a started run
    NoActiveRun { operation: String },
    /// `start` was called while a run is in progress and the restart policy rejects it
    RunAlreadyActive { status: String },
    /// Configuration error
    ConfigError { message: String },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InsufficientPoints {
                course,
                point_count,
                minimum_required,
            } => {
                write!(
                    f,
                    "Course '{}' has {} path points, minimum {} required",
                    course, point_count, minimum_required
                )
            }
            RunError::InvalidCoordinates { course, message } => {
                write!(f, "Course '{}' has invalid coordinates: {}", course, message)
            }
            RunError::DuplicatePointOfInterest { course, name } => {
                write!(
                    f,
                    "Course '{}' has more than one point of interest named '{}'",
                    course, name
                )
            }
            RunError::NoActiveRun { operation } => {
                write!(f, "Cannot {}: no run has been started", operation)
            }
            RunError::RunAlreadyActive { status } => {
                write!(f, "A run is already {}; end it before starting another", status)
            }
            RunError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for RunError {}

impl From<serde_json::Error> for RunError {
    fn from(err: serde_json::Error) -> Self {
        RunError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for run-tracker operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Extension trait for converting Option to RunError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a "no active run" error.
    fn ok_or_no_active_run(self, operation: &str) -> Result<T>;

    /// Convert Option to Result with insufficient points error.
    fn ok_or_insufficient_points(
        self,
        course: &str,
        point_count: usize,
        minimum: usize,
    ) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_no_active_run(self, operation: &str) -> Result<T> {
        self.ok_or_else(|| RunError::NoActiveRun {
            operation: operation.to_string(),
        })
    }

    fn ok_or_insufficient_points(
        self,
        course: &str,
        point_count: usize,
        minimum: usize,
    ) -> Result<T> {
        self.ok_or_else(|| RunError::InsufficientPoints {
            course: course.to_string(),
            point_count,
            minimum_required: minimum,
        })
    }
}
