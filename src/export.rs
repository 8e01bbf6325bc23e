use crate::error::{TrackerError, TrackerResult};
use crate::types::GeoPoint;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// GPX track format for mapping applications
#[derive(Debug, Serialize)]
pub struct GpxTrack {
    pub name: String,
    pub description: String,
    pub track_points: Vec<GpxPoint>,
}

#[derive(Debug, Serialize)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

impl GpxTrack {
    /// Build a track from a finished session path
    pub fn from_path(name: &str, description: &str, path: &[GeoPoint]) -> Self {
        let track_points = path
            .iter()
            .map(|p| GpxPoint {
                lat: p.latitude,
                lon: p.longitude,
                time: timestamp_to_iso(p.captured_at),
            })
            .collect();

        GpxTrack {
            name: name.to_string(),
            description: description.to_string(),
            track_points,
        }
    }

    /// Generate GPX document XML string
    pub fn to_gpx_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<gpx version=\"1.1\" creator=\"RunTracker\">\n");
        xml.push_str("  <metadata>\n");
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(&self.name)));
        xml.push_str(&format!("    <desc>{}</desc>\n", escape_xml(&self.description)));
        xml.push_str("  </metadata>\n");
        xml.push_str("  <trk>\n");
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(&self.name)));
        xml.push_str("    <type>running</type>\n");
        xml.push_str("    <trkseg>\n");

        for point in &self.track_points {
            xml.push_str(&format!(
                "      <trkpt lat=\"{:.7}\" lon=\"{:.7}\">\n",
                point.lat, point.lon
            ));
            xml.push_str(&format!("        <time>{}</time>\n", point.time));
            xml.push_str("      </trkpt>\n");
        }

        xml.push_str("    </trkseg>\n");
        xml.push_str("  </trk>\n");
        xml.push_str("</gpx>\n");

        xml
    }

    pub fn write(&self, path: &Path) -> TrackerResult<()> {
        fs::write(path, self.to_gpx_xml())
            .map_err(|e| TrackerError::Export(format!("{}: {}", path.display(), e)))
    }
}

fn timestamp_to_iso(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
