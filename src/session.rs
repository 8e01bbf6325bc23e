use crate::error::SensorFault;
use crate::health::{FixHealth, FixHealthState};
use crate::metrics::{ActivitySummary, SessionMetrics};
use crate::path::{IngestOutcome, PathAccumulator};
use crate::types::{GeoPoint, LocationFix};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Location acquisition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionStatus {
    /// Not tracking
    Off,
    /// Tracking requested, waiting for (or lost) a fix
    Searching,
    /// Receiving fixes
    Locked,
}

/// What happened to a fix handed to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// Session is not tracking; fix dropped
    Ignored,
    Rejected,
    Accepted,
}

/// Everything a completed session leaves behind
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    pub summary: ActivitySummary,
    pub path: Vec<GeoPoint>,
}

/// Single tracking session: status, path and metrics.
///
/// All mutation goes through this type; the tracker driver feeds it ticks and
/// fixes one at a time.
#[derive(Debug, Clone)]
pub struct Session {
    status: AcquisitionStatus,
    path: PathAccumulator,
    metrics: SessionMetrics,
    health: FixHealth,
    fault: Option<SensorFault>,
}

impl Session {
    /// `timeout_secs == 0` disables the location timeout
    pub fn new(fix_lapse_secs: u64, timeout_secs: u64) -> Self {
        Session {
            status: AcquisitionStatus::Off,
            path: PathAccumulator::new(),
            metrics: SessionMetrics::default(),
            health: FixHealth::new(fix_lapse_secs, timeout_secs),
            fault: None,
        }
    }

    /// Off → Searching. Returns false (and changes nothing) if already tracking.
    pub fn start(&mut self) -> bool {
        match self.status {
            AcquisitionStatus::Off => {
                self.reset();
                self.status = AcquisitionStatus::Searching;
                log::info!("Session started, searching for position");
                true
            }
            AcquisitionStatus::Searching | AcquisitionStatus::Locked => {
                log::debug!("start ignored, session already tracking");
                false
            }
        }
    }

    /// One second of tracking time.
    ///
    /// Returns the fault if the location timeout expired on this tick.
    pub fn on_tick(&mut self) -> Option<SensorFault> {
        if !self.is_tracking() {
            return None;
        }

        self.metrics.tick();

        match self.health.record_tick() {
            FixHealthState::Healthy => None,
            FixHealthState::Lapsed => {
                if self.status == AcquisitionStatus::Locked {
                    log::info!(
                        "No fix for {}s, searching again",
                        self.health.silent_seconds()
                    );
                    self.status = AcquisitionStatus::Searching;
                }
                None
            }
            FixHealthState::TimedOut => {
                self.fail(SensorFault::Timeout);
                Some(SensorFault::Timeout)
            }
        }
    }

    pub fn on_fix(&mut self, fix: &LocationFix) -> FixOutcome {
        if !self.is_tracking() {
            return FixOutcome::Ignored;
        }

        if self.status == AcquisitionStatus::Searching {
            log::info!("Position locked");
            self.status = AcquisitionStatus::Locked;
        }
        self.health.record_fix();
        self.metrics.observe_speed(fix.speed);

        match self.path.ingest(fix.point(), &mut self.metrics) {
            IngestOutcome::Accepted { segment_meters } => {
                log::debug!(
                    "fix accepted: +{:.1} m, total {:.1} m, {} points",
                    segment_meters,
                    self.metrics.total_distance_meters,
                    self.path.len()
                );
                FixOutcome::Accepted
            }
            IngestOutcome::Rejected => FixOutcome::Rejected,
        }
    }

    /// Sensor failure: go Off and keep metrics for inspection. No summary is produced.
    ///
    /// Returns false if the session was not tracking.
    pub fn fail(&mut self, fault: SensorFault) -> bool {
        if !self.is_tracking() {
            return false;
        }
        log::warn!(
            "Location failed after {}s: {}",
            self.metrics.elapsed_seconds,
            fault
        );
        self.status = AcquisitionStatus::Off;
        self.fault = Some(fault);
        true
    }

    /// End the session.
    ///
    /// A tracking session produces its summary and final path, then resets. A
    /// faulted session is discarded without a summary. Otherwise a no-op.
    pub fn stop(&mut self, body_weight_kg: f64) -> Option<FinishedSession> {
        match self.status {
            AcquisitionStatus::Searching | AcquisitionStatus::Locked => {
                self.status = AcquisitionStatus::Off;
                let summary = ActivitySummary::from_metrics(&self.metrics, body_weight_kg, Utc::now());
                let path = self.path.take();
                log::info!(
                    "Session stopped: {:.2} km in {}s, {} kcal",
                    summary.distance_km,
                    summary.duration_seconds,
                    summary.calories_burned
                );
                self.reset();
                Some(FinishedSession { summary, path })
            }
            AcquisitionStatus::Off => {
                if self.fault.is_some() {
                    log::info!("Discarding faulted session");
                    self.reset();
                }
                None
            }
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.metrics.reset();
        self.health.reset();
        self.fault = None;
    }

    pub fn status(&self) -> AcquisitionStatus {
        self.status
    }

    pub fn is_tracking(&self) -> bool {
        self.status != AcquisitionStatus::Off
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn path(&self) -> &[GeoPoint] {
        self.path.points()
    }

    pub fn fault(&self) -> Option<&SensorFault> {
        self.fault.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(10, 20)
    }
}
