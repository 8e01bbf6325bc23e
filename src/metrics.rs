/// Session metrics and energy estimate.
///
/// Elapsed time is driven by the 1 Hz tick, speed comes straight from the
/// latest raw fix, and calories are derived once at stop from the session's
/// average speed.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Average stride length in meters used for step estimation
pub const STRIDE_LENGTH_M: f64 = 0.762;

const MS_TO_KMH: f64 = 3.6;

/// Running counters for one session
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub elapsed_seconds: u64,
    pub total_distance_meters: f64,
    pub step_count_estimate: u64,
    pub instantaneous_speed_kmh: f64,
}

impl SessionMetrics {
    /// One tick of the session clock
    pub fn tick(&mut self) {
        self.elapsed_seconds += 1;
    }

    /// Record the device-reported speed of the latest fix (m/s)
    pub fn observe_speed(&mut self, speed_ms: Option<f64>) {
        self.instantaneous_speed_kmh = speed_ms
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s * MS_TO_KMH)
            .unwrap_or(0.0);
    }

    /// Add an accepted segment to distance and step count
    pub fn add_segment(&mut self, segment_meters: f64) {
        self.total_distance_meters += segment_meters;
        self.step_count_estimate += steps_for_segment(segment_meters);
    }

    pub fn distance_km(&self) -> f64 {
        self.total_distance_meters / 1000.0
    }

    /// Average speed over the session in km/h (0 before the first tick)
    pub fn average_speed_kmh(&self) -> f64 {
        average_speed_kmh(self.total_distance_meters, self.elapsed_seconds)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn steps_for_segment(segment_meters: f64) -> u64 {
    (segment_meters / STRIDE_LENGTH_M).floor() as u64
}

pub fn average_speed_kmh(distance_meters: f64, elapsed_seconds: u64) -> f64 {
    if elapsed_seconds == 0 {
        return 0.0;
    }
    (distance_meters / 1000.0) / (elapsed_seconds as f64 / 3600.0)
}

/// Metabolic equivalent for a given average speed. Tier upper bounds are inclusive.
pub fn met_for_speed(avg_speed_kmh: f64) -> f64 {
    if avg_speed_kmh > 12.0 {
        11.0
    } else if avg_speed_kmh > 9.0 {
        9.0
    } else if avg_speed_kmh > 6.0 {
        7.0
    } else {
        3.5
    }
}

pub fn estimate_calories(distance_meters: f64, elapsed_seconds: u64, body_weight_kg: f64) -> u32 {
    let met = met_for_speed(average_speed_kmh(distance_meters, elapsed_seconds));
    let hours = elapsed_seconds as f64 / 3600.0;
    (met * body_weight_kg * hours).floor().max(0.0) as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Cardio,
}

/// Record handed to persistence once per completed session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub timestamp_iso: String,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub calories_burned: u32,
    pub activity_type: ActivityType,
    pub exercises_completed: u32,
}

impl ActivitySummary {
    pub fn from_metrics(metrics: &SessionMetrics, body_weight_kg: f64, at: DateTime<Utc>) -> Self {
        ActivitySummary {
            timestamp_iso: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            distance_km: (metrics.distance_km() * 100.0).round() / 100.0,
            duration_seconds: metrics.elapsed_seconds,
            calories_burned: estimate_calories(
                metrics.total_distance_meters,
                metrics.elapsed_seconds,
                body_weight_kg,
            ),
            activity_type: ActivityType::Cardio,
            exercises_completed: 1,
        }
    }
}

/// `[h:]mm:ss`
pub fn format_elapsed(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
