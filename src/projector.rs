//! Live path view.
//!
//! Projects the session path into surface coordinates: the bounding box of all
//! points is stretched to fill the surface minus a padding margin, longitude on
//! x and latitude on y with north up. A bounding box with zero extent on an axis
//! is widened by [`MIN_HALF_EXTENT_DEG`] on each side of that axis.

use crate::types::GeoPoint;
use geo::{BoundingRect, Coord, LineString};
use serde::{Deserialize, Serialize};

/// Half-width (degrees) of the window used when all points share a latitude or longitude
pub const MIN_HALF_EXTENT_DEG: f64 = 0.0005;

pub const MARKER_RADIUS: f64 = 6.0;
pub const RING_RADIUS: f64 = 12.0;

/// Size and layout of the drawing surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
    /// Margin kept free on every side
    pub padding: f64,
    pub grid_spacing: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            width: 600.0,
            height: 300.0,
            padding: 60.0,
            grid_spacing: 40.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawPrimitive {
    /// Background with grid lines and a centre crosshair
    Grid { width: f64, height: f64, spacing: f64 },
    Polyline { points: Vec<ScreenPoint> },
    /// Filled dot at the current position
    Marker { center: ScreenPoint, radius: f64 },
    /// Outline ring around the current position
    Ring { center: ScreenPoint, radius: f64 },
}

/// Primitives for one redraw, in paint order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<DrawPrimitive>,
}

/// Linear map from lat/lon bounds onto the padded surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    min_lat: f64,
    lat_range: f64,
    min_lon: f64,
    lon_range: f64,
    width: f64,
    height: f64,
    padding: f64,
}

impl Viewport {
    /// Returns `None` for an empty path
    pub fn fit(path: &[GeoPoint], surface: &SurfaceConfig) -> Option<Self> {
        let line: LineString<f64> = path
            .iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect::<Vec<_>>()
            .into();
        let bounds = line.bounding_rect()?;

        let (min_lon, max_lon) = widen_if_flat(bounds.min().x, bounds.max().x);
        let (min_lat, max_lat) = widen_if_flat(bounds.min().y, bounds.max().y);

        Some(Viewport {
            min_lat,
            lat_range: max_lat - min_lat,
            min_lon,
            lon_range: max_lon - min_lon,
            width: surface.width,
            height: surface.height,
            padding: surface.padding,
        })
    }

    pub fn project(&self, point: &GeoPoint) -> ScreenPoint {
        let inner_w = (self.width - self.padding * 2.0).max(0.0);
        let inner_h = (self.height - self.padding * 2.0).max(0.0);
        let x = (point.longitude - self.min_lon) / self.lon_range * inner_w + self.padding;
        let y = self.height
            - ((point.latitude - self.min_lat) / self.lat_range * inner_h + self.padding);
        ScreenPoint { x, y }
    }
}

fn widen_if_flat(min: f64, max: f64) -> (f64, f64) {
    if max == min {
        (min - MIN_HALF_EXTENT_DEG, max + MIN_HALF_EXTENT_DEG)
    } else {
        (min, max)
    }
}

/// Build the frame for the current path. Pure; called after every path change.
pub fn project(path: &[GeoPoint], surface: &SurfaceConfig) -> Frame {
    let mut primitives = vec![DrawPrimitive::Grid {
        width: surface.width,
        height: surface.height,
        spacing: surface.grid_spacing,
    }];

    if let (Some(viewport), Some(last)) = (Viewport::fit(path, surface), path.last()) {
        if path.len() > 1 {
            primitives.push(DrawPrimitive::Polyline {
                points: path.iter().map(|p| viewport.project(p)).collect(),
            });
        }

        let current = viewport.project(last);
        primitives.push(DrawPrimitive::Marker {
            center: current,
            radius: MARKER_RADIUS,
        });
        primitives.push(DrawPrimitive::Ring {
            center: current,
            radius: RING_RADIUS,
        });
    }

    Frame {
        width: surface.width,
        height: surface.height,
        primitives,
    }
}

impl Frame {
    pub fn polyline(&self) -> Option<&[ScreenPoint]> {
        self.primitives.iter().find_map(|p| match p {
            DrawPrimitive::Polyline { points } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn marker_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| matches!(p, DrawPrimitive::Marker { .. }))
            .count()
    }

    /// Render as a standalone SVG document
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
            self.width, self.height, self.width, self.height
        ));

        for primitive in &self.primitives {
            match primitive {
                DrawPrimitive::Grid {
                    width,
                    height,
                    spacing,
                } => {
                    svg.push_str(&format!(
                        "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#0a0a0a\"/>\n",
                        width, height
                    ));
                    svg.push_str("  <g stroke=\"#27272a\" stroke-width=\"1\">\n");
                    // Lines only for a usable spacing on a finite surface
                    if *spacing > 0.0 && width.is_finite() && height.is_finite() {
                        let mut x = 0.0;
                        while x < *width {
                            svg.push_str(&format!(
                                "    <line x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{height}\"/>\n"
                            ));
                            x += spacing;
                        }
                        let mut y = 0.0;
                        while y < *height {
                            svg.push_str(&format!(
                                "    <line x1=\"0\" y1=\"{y}\" x2=\"{width}\" y2=\"{y}\"/>\n"
                            ));
                            y += spacing;
                        }
                    }
                    svg.push_str("  </g>\n");
                    svg.push_str(&format!(
                        "  <g stroke=\"#3f3f46\" stroke-width=\"1\">\n    <line x1=\"{cx}\" y1=\"0\" x2=\"{cx}\" y2=\"{height}\"/>\n    <line x1=\"0\" y1=\"{cy}\" x2=\"{width}\" y2=\"{cy}\"/>\n  </g>\n",
                        cx = width / 2.0,
                        cy = height / 2.0,
                    ));
                }
                DrawPrimitive::Polyline { points } => {
                    let coords: Vec<String> = points
                        .iter()
                        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                        .collect();
                    svg.push_str(&format!(
                        "  <polyline points=\"{}\" fill=\"none\" stroke=\"#FBFF00\" stroke-width=\"4\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n",
                        coords.join(" ")
                    ));
                }
                DrawPrimitive::Marker { center, radius } => {
                    svg.push_str(&format!(
                        "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"#FBFF00\"/>\n",
                        center.x, center.y, radius
                    ));
                }
                DrawPrimitive::Ring { center, radius } => {
                    svg.push_str(&format!(
                        "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"none\" stroke=\"rgba(251,255,0,0.5)\" stroke-width=\"2\"/>\n",
                        center.x, center.y, radius
                    ));
                }
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn surface() -> SurfaceConfig {
        SurfaceConfig::default()
    }

    #[test]
    fn test_empty_path_draws_grid_only() {
        let frame = project(&[], &surface());
        assert_eq!(
            frame.primitives,
            vec![DrawPrimitive::Grid {
                width: 600.0,
                height: 300.0,
                spacing: 40.0
            }]
        );
    }

    #[test]
    fn test_single_point_centered_without_polyline() {
        let frame = project(&[GeoPoint::new(48.85, 2.35, 0.0)], &surface());

        assert_eq!(frame.primitives.len(), 3);
        assert!(matches!(frame.primitives[0], DrawPrimitive::Grid { .. }));
        assert!(frame.polyline().is_none());
        assert_eq!(frame.marker_count(), 1);

        match &frame.primitives[1] {
            DrawPrimitive::Marker { center, radius } => {
                assert!(center.x.is_finite() && center.y.is_finite());
                assert_relative_eq!(center.x, 300.0, epsilon = 1e-6);
                assert_relative_eq!(center.y, 150.0, epsilon = 1e-6);
                assert_eq!(*radius, MARKER_RADIUS);
            }
            other => panic!("expected marker, got {other:?}"),
        }
        assert!(matches!(
            frame.primitives[2],
            DrawPrimitive::Ring { radius, .. } if radius == RING_RADIUS
        ));
    }

    #[test]
    fn test_primitive_order_for_longer_path() {
        let path = vec![
            GeoPoint::new(0.0, 0.0, 0.0),
            GeoPoint::new(0.001, 0.001, 1.0),
            GeoPoint::new(0.002, 0.0015, 2.0),
        ];
        let frame = project(&path, &surface());

        let kinds: Vec<&str> = frame
            .primitives
            .iter()
            .map(|p| match p {
                DrawPrimitive::Grid { .. } => "grid",
                DrawPrimitive::Polyline { .. } => "polyline",
                DrawPrimitive::Marker { .. } => "marker",
                DrawPrimitive::Ring { .. } => "ring",
            })
            .collect();
        assert_eq!(kinds, vec!["grid", "polyline", "marker", "ring"]);
        assert_eq!(frame.polyline().unwrap().len(), 3);
    }

    #[test]
    fn test_corners_map_to_padded_edges_north_up() {
        let path = vec![
            GeoPoint::new(10.0, 20.0, 0.0),
            GeoPoint::new(10.01, 20.02, 1.0),
        ];
        let frame = project(&path, &surface());
        let line = frame.polyline().unwrap();

        // south-west corner -> bottom-left inside padding
        assert_relative_eq!(line[0].x, 60.0, epsilon = 1e-6);
        assert_relative_eq!(line[0].y, 240.0, epsilon = 1e-6);
        // north-east corner -> top-right inside padding
        assert_relative_eq!(line[1].x, 540.0, epsilon = 1e-6);
        assert_relative_eq!(line[1].y, 60.0, epsilon = 1e-6);
    }

    #[test]
    fn test_points_stay_inside_padding() {
        let path: Vec<GeoPoint> = (0..50)
            .map(|i| {
                let t = i as f64;
                GeoPoint::new(45.0 + (t * 0.3).sin() * 0.002, 7.0 + t * 0.0001, t)
            })
            .collect();
        let s = surface();
        let frame = project(&path, &s);

        for p in frame.polyline().unwrap() {
            assert!(p.x >= s.padding - 1e-9 && p.x <= s.width - s.padding + 1e-9);
            assert!(p.y >= s.padding - 1e-9 && p.y <= s.height - s.padding + 1e-9);
        }
    }

    #[test]
    fn test_flat_axis_is_widened() {
        // due east: zero latitude extent
        let path = vec![GeoPoint::new(5.0, 5.0, 0.0), GeoPoint::new(5.0, 5.01, 1.0)];
        let frame = project(&path, &surface());
        let line = frame.polyline().unwrap();

        assert_relative_eq!(line[0].y, 150.0, epsilon = 1e-6);
        assert_relative_eq!(line[1].y, 150.0, epsilon = 1e-6);
        assert_relative_eq!(line[0].x, 60.0, epsilon = 1e-6);
        assert_relative_eq!(line[1].x, 540.0, epsilon = 1e-6);
    }

    #[test]
    fn test_svg_output() {
        let path = vec![GeoPoint::new(0.0, 0.0, 0.0), GeoPoint::new(0.001, 0.001, 1.0)];
        let svg = project(&path, &surface()).to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_svg_with_unusable_grid_spacing() {
        let path = vec![GeoPoint::new(0.0, 0.0, 0.0), GeoPoint::new(0.001, 0.001, 1.0)];
        for spacing in [0.0, -40.0, f64::NAN] {
            let mut s = surface();
            s.grid_spacing = spacing;
            let svg = project(&path, &s).to_svg();

            // only the two center axes remain
            assert_eq!(svg.matches("<line").count(), 2);
            assert!(svg.contains("<polyline"));
            assert!(svg.trim_end().ends_with("</svg>"));
        }
    }

    #[test]
    fn test_svg_grid_line_count() {
        let svg = project(&[], &surface()).to_svg();
        // 600 / 40 vertical + 300 / 40 horizontal (rounded up) + 2 axes
        assert_eq!(svg.matches("<line").count(), 15 + 8 + 2);
    }
}
