//! Run summaries and display formatting.
//!
//! A [`RunSummary`] is the frozen result of a finished run. It owns copies
//! of everything it reports, so it outlives the session reset that follows
//! `end()` and any later runs.

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result};
use crate::session::RunSession;
use crate::GeoPoint;

/// Immutable result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub course_title: String,
    pub elapsed_seconds: u64,
    pub total_distance_km: f64,
    pub total_calories: f64,
    /// Minutes per kilometer; 0 when no distance was covered
    pub average_pace_min_per_km: f64,
    pub recorded_path: Vec<GeoPoint>,
    /// Landmarks reached, in visit order
    pub visited_point_names: Vec<String>,
    /// Length of the course itself, for the certificate
    pub course_distance_km: f64,
}

impl RunSummary {
    /// Pace as `M'SS''`.
    pub fn formatted_pace(&self) -> String {
        format_pace(self.average_pace_min_per_km)
    }

    /// Elapsed time as `HH:MM:SS`.
    pub fn formatted_elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    /// Distance with two decimals.
    pub fn formatted_distance(&self) -> String {
        format_distance_km(self.total_distance_km)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Freeze the session's current totals into a summary.
///
/// Fails when no course is bound, i.e. no run was started.
pub fn summarize(session: &RunSession) -> Result<RunSummary> {
    let course = session.course().ok_or_no_active_run("summarize the run")?;

    let total_distance_km = session.cumulative_distance_km();
    let pace = session.average_pace_min_per_km();
    let average_pace_min_per_km = if total_distance_km > 0.0 && pace.is_finite() {
        pace
    } else {
        0.0
    };

    Ok(RunSummary {
        course_title: course.title().to_string(),
        elapsed_seconds: session.elapsed_seconds(),
        total_distance_km,
        total_calories: session.calorie_model().calories_for(total_distance_km),
        average_pace_min_per_km,
        recorded_path: session.recorded_path().to_vec(),
        visited_point_names: session.visit_order().to_vec(),
        course_distance_km: course.total_distance_km(),
    })
}

/// Format a pace in minutes per kilometer as `M'SS''`.
///
/// Zero, negative and non-finite paces render as `0'00''`.
///
/// ```rust
/// use run_tracker::summary::format_pace;
///
/// assert_eq!(format_pace(5.5), "5'30''");
/// assert_eq!(format_pace(0.0), "0'00''");
/// assert_eq!(format_pace(f64::INFINITY), "0'00''");
/// ```
pub fn format_pace(pace_min_per_km: f64) -> String {
    if !pace_min_per_km.is_finite() || pace_min_per_km <= 0.0 {
        return "0'00''".to_string();
    }
    let mut minutes = pace_min_per_km.floor() as u64;
    let mut seconds = ((pace_min_per_km - minutes as f64) * 60.0).round() as u64;
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }
    format!("{}'{:02}''", minutes, seconds)
}

/// Format seconds as `HH:MM:SS`.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format kilometers with two decimals.
pub fn format_distance_km(distance_km: f64) -> String {
    format!("{:.2}", distance_km)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Course, LocationSample, RunError};

    fn course() -> Course {
        Course::new(
            "Seaside",
            vec![GeoPoint::new(33.540, 126.560), GeoPoint::new(33.550, 126.560)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(5.0), "5'00''");
        assert_eq!(format_pace(4.25), "4'15''");
        assert_eq!(format_pace(f64::NAN), "0'00''");
        assert_eq!(format_pace(-1.0), "0'00''");
        // 5.999 min rounds to 60 s and carries
        assert_eq!(format_pace(5.999), "6'00''");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(59), "00:00:59");
        assert_eq!(format_elapsed(3_725), "01:02:05");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance_km(0.0), "0.00");
        assert_eq!(format_distance_km(2.345_6), "2.35");
    }

    #[test]
    fn test_summarize_idle_is_error() {
        let session = RunSession::default();
        assert!(matches!(
            summarize(&session),
            Err(RunError::NoActiveRun { .. })
        ));
    }

    #[test]
    fn test_zero_distance_summary() {
        let mut session = RunSession::default();
        session.start(course()).unwrap();
        for _ in 0..30 {
            session.tick();
        }
        let summary = session.end().unwrap();
        assert_eq!(summary.total_distance_km, 0.0);
        assert_eq!(summary.average_pace_min_per_km, 0.0);
        assert_eq!(summary.total_calories, 0.0);
        assert_eq!(summary.formatted_pace(), "0'00''");
        assert_eq!(summary.formatted_elapsed(), "00:00:30");
    }

    #[test]
    fn test_summary_matches_session() {
        let mut session = RunSession::default();
        session.start(course()).unwrap();
        session.location_update(LocationSample::new(33.540, 126.560));
        for _ in 0..60 {
            session.tick();
        }
        session.location_update(LocationSample::new(33.5409, 126.560));

        let distance = session.cumulative_distance_km();
        let pace = session.average_pace_min_per_km();
        let summary = summarize(&session).unwrap();

        assert_eq!(summary.course_title, "Seaside");
        assert_eq!(summary.total_distance_km, distance);
        assert_eq!(summary.average_pace_min_per_km, pace);
        assert!((summary.total_calories - distance * 65.0).abs() < 1e-9);
        assert_eq!(summary.recorded_path.len(), 2);
        assert!((summary.course_distance_km - 1.112).abs() < 0.01);
    }

    #[test]
    fn test_to_json() {
        let mut session = RunSession::default();
        session.start(course()).unwrap();
        let json = session.end().unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["course_title"], "Seaside");
        assert_eq!(value["elapsed_seconds"], 0);
    }
}
