use crate::location::current_timestamp;
use crate::session::{AcquisitionStatus, Session};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Snapshot of the running session for displays and the status file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub status: AcquisitionStatus,
    pub elapsed_seconds: u64,
    pub total_distance_meters: f64,
    pub distance_km: f64,
    pub step_count_estimate: u64,
    pub instantaneous_speed_kmh: f64,
    pub average_speed_kmh: f64,
    pub path_points: usize,
    // Last sensor fault, kept until the session is stopped or restarted
    pub error: Option<String>,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            status: AcquisitionStatus::Off,
            elapsed_seconds: 0,
            total_distance_meters: 0.0,
            distance_km: 0.0,
            step_count_estimate: 0,
            instantaneous_speed_kmh: 0.0,
            average_speed_kmh: 0.0,
            path_points: 0,
            error: None,
        }
    }

    pub fn capture(session: &Session) -> Self {
        let metrics = session.metrics();
        Self {
            timestamp: current_timestamp(),
            status: session.status(),
            elapsed_seconds: metrics.elapsed_seconds,
            total_distance_meters: metrics.total_distance_meters,
            distance_km: metrics.distance_km(),
            step_count_estimate: metrics.step_count_estimate,
            instantaneous_speed_kmh: metrics.instantaneous_speed_kmh,
            average_speed_kmh: metrics.average_speed_kmh(),
            path_points: session.path().len(),
            error: session.fault().map(|f| f.to_string()),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}
