use crate::error::{SensorFault, TrackerError, TrackerResult};
use crate::types::LocationFix;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration};

/// Parameters passed to the location service when a watch is requested
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Maximum wait for a fix before the watch reports a timeout
    pub timeout_ms: u64,
    /// Maximum age of a cached fix (0 = always fresh)
    pub maximum_age_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            high_accuracy: true,
            timeout_ms: 20_000,
            maximum_age_ms: 0,
        }
    }
}

impl WatchOptions {
    /// Timeout rounded up to whole session ticks
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_ms.div_ceil(1000)
    }
}

/// One event on a position watch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LocationUpdate {
    Fix(LocationFix),
    Error(SensorFault),
}

/// Active subscription to position updates.
///
/// Clearing or dropping the watch stops the producer and closes the channel, so
/// nothing queued after that point can reach the consumer.
pub struct LocationWatch {
    updates: Receiver<LocationUpdate>,
    producer: Option<JoinHandle<()>>,
}

impl LocationWatch {
    pub fn new(updates: Receiver<LocationUpdate>, producer: Option<JoinHandle<()>>) -> Self {
        LocationWatch { updates, producer }
    }

    /// Next update, or `None` once the producer has finished
    pub async fn recv(&mut self) -> Option<LocationUpdate> {
        self.updates.recv().await
    }

    pub fn clear(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
        self.updates.close();
    }
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Source of continuous position updates
pub trait LocationService: Send + 'static {
    /// Register a watch. Fails with `SensorUnavailable` when the host has no location support.
    fn watch_position(&mut self, options: &WatchOptions) -> TrackerResult<LocationWatch>;
}

const WATCH_CHANNEL_CAPACITY: usize = 100;

/// Host without any location support
#[derive(Clone, Debug, Default)]
pub struct UnavailableLocationService;

impl LocationService for UnavailableLocationService {
    fn watch_position(&mut self, _options: &WatchOptions) -> TrackerResult<LocationWatch> {
        Err(TrackerError::SensorUnavailable)
    }
}

/// Synthetic jogger: one fix per interval moving north-east at roughly 10 km/h
#[derive(Clone, Debug)]
pub struct SimulatedLocationService {
    pub origin: (f64, f64),
    pub fix_interval: Duration,
}

impl Default for SimulatedLocationService {
    fn default() -> Self {
        SimulatedLocationService {
            origin: (37.7749, -122.4194),
            fix_interval: Duration::from_secs(1),
        }
    }
}

impl LocationService for SimulatedLocationService {
    fn watch_position(&mut self, options: &WatchOptions) -> TrackerResult<LocationWatch> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        log::info!(
            "Simulated location watch started (high_accuracy={}, timeout={}ms)",
            options.high_accuracy,
            options.timeout_ms
        );
        let producer = tokio::spawn(simulated_fix_loop(tx, self.origin, self.fix_interval));
        Ok(LocationWatch::new(rx, Some(producer)))
    }
}

async fn simulated_fix_loop(tx: Sender<LocationUpdate>, origin: (f64, f64), period: Duration) {
    let mut interval = interval(period);
    let mut seq = 0u64;

    loop {
        interval.tick().await;

        let fix = simulated_fix(origin, seq);
        match tx.try_send(LocationUpdate::Fix(fix)) {
            Ok(_) => {
                seq += 1;
                if seq % 30 == 0 {
                    log::debug!("[gps] {} simulated fixes", seq);
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("[gps] watch closed after {} fixes", seq);
                break;
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Consumer is behind, drop this fix
            }
        }
    }
}

fn simulated_fix(origin: (f64, f64), seq: u64) -> LocationFix {
    let s = seq as f64;
    // ~2.2 m north and ~1.8 m east per fix, with a small wobble
    let wobble = (s * 0.5).sin() * 0.000002;
    LocationFix {
        timestamp: current_timestamp(),
        latitude: origin.0 + s * 0.00002 + wobble,
        longitude: origin.1 + s * 0.00002,
        speed: Some(2.8 + (s * 0.5).sin() * 0.4),
    }
}

/// One scripted update, delivered `after` the previous one
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedUpdate {
    pub after: Duration,
    pub update: LocationUpdate,
}

/// Replays a fixed list of updates with the given delays on every watch
#[derive(Clone, Debug, Default)]
pub struct ScriptedLocationService {
    script: Vec<ScriptedUpdate>,
}

impl ScriptedLocationService {
    pub fn new(script: Vec<ScriptedUpdate>) -> Self {
        ScriptedLocationService { script }
    }

    /// Schedule fixes by their own timestamps, relative to the first one.
    ///
    /// Fails if a gap between consecutive timestamps cannot be represented as a delay.
    pub fn from_fixes(fixes: &[LocationFix]) -> TrackerResult<Self> {
        let mut previous = fixes.first().map(|f| f.timestamp).unwrap_or(0.0);
        let script = fixes
            .iter()
            .map(|fix| -> TrackerResult<ScriptedUpdate> {
                let gap = (fix.timestamp - previous).max(0.0);
                previous = fix.timestamp;
                let after = Duration::try_from_secs_f64(gap).map_err(|e| {
                    TrackerError::Storage(format!(
                        "fix at {} follows a {}s gap: {}",
                        fix.timestamp, gap, e
                    ))
                })?;
                Ok(ScriptedUpdate {
                    after,
                    update: LocationUpdate::Fix(fix.clone()),
                })
            })
            .collect::<TrackerResult<Vec<_>>>()?;
        Ok(ScriptedLocationService { script })
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl LocationService for ScriptedLocationService {
    fn watch_position(&mut self, _options: &WatchOptions) -> TrackerResult<LocationWatch> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let script = self.script.clone();
        let producer = tokio::spawn(async move {
            for step in script {
                sleep(step.after).await;
                if tx.send(step.update).await.is_err() {
                    break;
                }
            }
        });
        Ok(LocationWatch::new(rx, Some(producer)))
    }
}

/// Recorded fixes: `{"fixes": [...]}`, optionally gzip-compressed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixLog {
    pub fixes: Vec<LocationFix>,
}

impl FixLog {
    /// Load a `.json` or `.json.gz` log
    pub fn load(path: &Path) -> TrackerResult<Self> {
        let file = File::open(path)?;
        let log = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            serde_json::from_reader(BufReader::new(GzDecoder::new(file)))?
        } else {
            serde_json::from_reader(BufReader::new(file))?
        };
        Ok(log)
    }

    /// Fixes sorted by timestamp
    pub fn sorted_fixes(&self) -> Vec<LocationFix> {
        let mut fixes = self.fixes.clone();
        fixes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        fixes
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
