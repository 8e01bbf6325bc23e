//! Noise filter for incoming position fixes.
//!
//! A fix is kept only when it lies further than [`NOISE_THRESHOLD_M`] from the
//! last accepted point; anything closer is treated as GPS jitter.

use crate::types::GeoPoint;

/// Spherical Earth radius used for all distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum movement (meters) before a fix is appended to the path
pub const NOISE_THRESHOLD_M: f64 = 1.5;

/// Great-circle distance in meters between two lat/lon pairs (degrees)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Distance in meters between two points
pub fn distance_between(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Returns the segment length if `candidate` should be kept.
///
/// The first fix of a session has no predecessor and is kept with a zero-length
/// segment. Fixes with non-finite coordinates are never kept.
pub fn evaluate(candidate: &GeoPoint, last_accepted: Option<&GeoPoint>) -> Option<f64> {
    if !(candidate.latitude.is_finite() && candidate.longitude.is_finite()) {
        return None;
    }

    match last_accepted {
        None => Some(0.0),
        Some(last) => {
            let segment = distance_between(last, candidate);
            (segment > NOISE_THRESHOLD_M).then_some(segment)
        }
    }
}

/// Whether `candidate` passes the noise filter
pub fn accept(candidate: &GeoPoint, last_accepted: Option<&GeoPoint>) -> bool {
    evaluate(candidate, last_accepted).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_symmetric_and_zero() {
        let pairs = [
            ((0.0, 0.0), (0.0, 0.001)),
            ((37.7749, -122.4194), (37.7755, -122.4180)),
            ((-33.86, 151.21), (51.5, -0.12)),
            ((89.9, 10.0), (-89.9, -170.0)),
        ];

        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            assert_relative_eq!(ab, ba, max_relative = 1e-12);
            assert_eq!(haversine_distance(lat1, lon1, lat1, lon1), 0.0);
        }
    }

    #[test]
    fn test_one_millidegree_longitude_at_equator() {
        // 6_371_000 * 0.001 * PI / 180
        let d = haversine_distance(0.0, 0.0, 0.0, 0.001);
        assert_relative_eq!(d, 111.194_926_6, epsilon = 1e-3);
    }

    #[test]
    fn test_first_fix_always_accepted() {
        let p = GeoPoint::new(10.0, 20.0, 0.0);
        assert!(accept(&p, None));
        assert_eq!(evaluate(&p, None), Some(0.0));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let last = GeoPoint::new(0.0, 0.0, 0.0);
        for bad in [
            GeoPoint::new(f64::NAN, 0.0, 1.0),
            GeoPoint::new(0.0, f64::INFINITY, 1.0),
            GeoPoint::new(f64::NEG_INFINITY, f64::NAN, 1.0),
        ] {
            assert_eq!(evaluate(&bad, None), None);
            assert!(!accept(&bad, Some(&last)));
        }
    }

    #[test]
    fn test_jitter_rejected() {
        let last = GeoPoint::new(0.0, 0.0, 0.0);
        // ~1.1 m east
        let near = GeoPoint::new(0.0, 0.00001, 1.0);
        assert!(!accept(&near, Some(&last)));

        // identical position
        let same = GeoPoint::new(0.0, 0.0, 2.0);
        assert!(!accept(&same, Some(&last)));
    }

    #[test]
    fn test_movement_accepted_with_segment_length() {
        let last = GeoPoint::new(0.0, 0.0, 0.0);
        // ~2.2 m east
        let moved = GeoPoint::new(0.0, 0.00002, 1.0);
        let segment = evaluate(&moved, Some(&last)).expect("should pass filter");
        assert!(segment > NOISE_THRESHOLD_M);
        assert_relative_eq!(segment, distance_between(&last, &moved));
    }

    #[test]
    fn test_filter_is_deterministic() {
        let last = GeoPoint::new(51.5, -0.12, 0.0);
        let candidate = GeoPoint::new(51.50002, -0.12, 1.0);
        let first = evaluate(&candidate, Some(&last));
        for _ in 0..10 {
            assert_eq!(evaluate(&candidate, Some(&last)), first);
        }
    }
}
