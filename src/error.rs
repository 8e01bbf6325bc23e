use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the location service for an active watch
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorFault {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// Run tracker error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Location service not available on this host")]
    SensorUnavailable,

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorFault),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Tracker task is no longer running")]
    TrackerClosed,
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}
