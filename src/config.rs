use crate::error::{TrackerError, TrackerResult};
use crate::location::WatchOptions;
use crate::projector::SurfaceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The person being tracked; weight is read when a session stops
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub body_weight_kg: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            user_id: "local".to_string(),
            body_weight_kg: 70.0,
        }
    }
}

/// Tracker configuration, loadable from a JSON file. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub watch: WatchOptions,
    /// Seconds without a fix before a locked session drops back to searching
    pub fix_lapse_secs: u64,
    pub surface: SurfaceConfig,
    pub profile: UserProfile,
    pub output_dir: PathBuf,
    /// How often the CLI writes live_status.json
    pub status_interval_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            watch: WatchOptions::default(),
            fix_lapse_secs: 10,
            surface: SurfaceConfig::default(),
            profile: UserProfile::default(),
            output_dir: PathBuf::from("run_tracker_sessions"),
            status_interval_secs: 2,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: &Path) -> TrackerResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TrackerError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: TrackerConfig = serde_json::from_str(&text)
            .map_err(|e| TrackerError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        let weight = self.profile.body_weight_kg;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(TrackerError::InvalidConfig(format!(
                "body weight must be positive, got {}",
                weight
            )));
        }
        if self.profile.user_id.trim().is_empty() {
            return Err(TrackerError::InvalidConfig("user id is empty".to_string()));
        }

        let surface = &self.surface;
        if surface.width <= 0.0 || surface.height <= 0.0 {
            return Err(TrackerError::InvalidConfig(format!(
                "surface must have a positive size, got {}x{}",
                surface.width, surface.height
            )));
        }
        if surface.padding < 0.0
            || surface.padding * 2.0 >= surface.width
            || surface.padding * 2.0 >= surface.height
        {
            return Err(TrackerError::InvalidConfig(format!(
                "padding {} leaves no drawable area on a {}x{} surface",
                surface.padding, surface.width, surface.height
            )));
        }
        if surface.grid_spacing <= 0.0 {
            return Err(TrackerError::InvalidConfig(
                "grid spacing must be positive".to_string(),
            ));
        }

        if self.fix_lapse_secs == 0 {
            return Err(TrackerError::InvalidConfig(
                "fix_lapse_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
