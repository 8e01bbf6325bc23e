use crate::error::{TrackerError, TrackerResult};
use crate::metrics::ActivitySummary;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Where completed sessions go. The engine only ever writes.
pub trait ActivityStore: Send {
    fn log_activity(&mut self, user_id: &str, summary: &ActivitySummary) -> TrackerResult<()>;
}

/// Line stored in the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub summary: ActivitySummary,
}

/// Appends one JSON line per summary to `<dir>/<user>_activities.jsonl`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    pub fn log_path(&self, user_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}_activities.jsonl", sanitize_user_id(user_id)))
    }
}

impl ActivityStore for JsonFileStore {
    fn log_activity(&mut self, user_id: &str, summary: &ActivitySummary) -> TrackerResult<()> {
        fs::create_dir_all(&self.dir)?;

        let record = ActivityRecord {
            user_id: user_id.to_string(),
            summary: summary.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let path = self.log_path(user_id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        log::info!("Logged activity for {} to {}", user_id, path.display());
        Ok(())
    }
}

/// Keeps records in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<ActivityRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ActivityStore for MemoryStore {
    fn log_activity(&mut self, user_id: &str, summary: &ActivitySummary) -> TrackerResult<()> {
        let mut records = self.records.lock().map_err(|_| {
            TrackerError::Storage("activity log lock poisoned".to_string())
        })?;
        records.push(ActivityRecord {
            user_id: user_id.to_string(),
            summary: summary.clone(),
        });
        Ok(())
    }
}

fn sanitize_user_id(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read back every record in a log written by [`JsonFileStore`]
pub fn read_activity_log(path: &Path) -> TrackerResult<Vec<ActivityRecord>> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<ActivityRecord>(l).map_err(TrackerError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ActivityType;

    fn summary(calories: u32) -> ActivitySummary {
        ActivitySummary {
            timestamp_iso: "2025-11-19T12:00:00.000Z".to_string(),
            distance_km: 1.25,
            duration_seconds: 600,
            calories_burned: calories,
            activity_type: ActivityType::Cardio,
            exercises_completed: 1,
        }
    }

    #[test]
    fn test_file_store_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("logs"));

        store.log_activity("ana@example.com", &summary(80)).unwrap();
        store.log_activity("ana@example.com", &summary(95)).unwrap();

        let path = store.log_path("ana@example.com");
        assert!(path.ends_with("ana_example.com_activities.jsonl"));

        let records = read_activity_log(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id, "ana@example.com");
        assert_eq!(records[1].summary.calories_burned, 95);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.lines().all(|l| l.contains("\"activity_type\":\"cardio\"")));
    }

    #[test]
    fn test_users_get_separate_logs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        store.log_activity("a", &summary(1)).unwrap();
        store.log_activity("b", &summary(2)).unwrap();

        assert_eq!(read_activity_log(&store.log_path("a")).unwrap().len(), 1);
        assert_eq!(read_activity_log(&store.log_path("b")).unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.log_activity("u", &summary(10)).unwrap();

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary, summary(10));
    }
}
