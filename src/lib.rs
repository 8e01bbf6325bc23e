// Run Tracker core library
// Live activity tracking: fix filtering, path and metrics accumulation,
// session lifecycle and route projection for display.

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod health;
pub mod location;
pub mod metrics;
pub mod path;
pub mod projector;
pub mod session;
pub mod status;
pub mod storage;
pub mod tracker;
pub mod types;

pub use config::{TrackerConfig, UserProfile};
pub use error::{SensorFault, TrackerError, TrackerResult};
pub use location::{LocationService, LocationUpdate, LocationWatch, WatchOptions};
pub use metrics::{ActivitySummary, ActivityType, SessionMetrics};
pub use projector::{project, DrawPrimitive, Frame, ScreenPoint, SurfaceConfig};
pub use session::{AcquisitionStatus, FinishedSession, Session};
pub use status::LiveStatus;
pub use storage::{ActivityStore, JsonFileStore, MemoryStore};
pub use tracker::{Tracker, TrackerHandle};
pub use types::{GeoPoint, LocationFix};
