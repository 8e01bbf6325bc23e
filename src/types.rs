use serde::{Deserialize, Serialize};

/// Accepted position on the session path
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Seconds, as stamped by the location service
    pub captured_at: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, captured_at: f64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }
}

/// Raw reading delivered by the location service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Speed over ground in m/s, when the device reports one
    #[serde(default)]
    pub speed: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, speed: Option<f64>, timestamp: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            speed,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude, self.timestamp)
    }
}
