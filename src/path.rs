use crate::filter;
use crate::metrics::SessionMetrics;
use crate::types::GeoPoint;

/// Result of offering a fix to the path
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IngestOutcome {
    /// Appended; carries the segment length from the previous point (0 for the first)
    Accepted { segment_meters: f64 },
    /// Within the noise threshold of the last point
    Rejected,
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted { .. })
    }
}

/// Ordered list of accepted points for the current session
#[derive(Clone, Debug, Default)]
pub struct PathAccumulator {
    points: Vec<GeoPoint>,
}

impl PathAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `candidate` against the last accepted point and append it if it moved.
    ///
    /// Distance and step counters in `metrics` change only on acceptance.
    pub fn ingest(&mut self, candidate: GeoPoint, metrics: &mut SessionMetrics) -> IngestOutcome {
        match filter::evaluate(&candidate, self.points.last()) {
            Some(segment_meters) => {
                self.points.push(candidate);
                metrics.add_segment(segment_meters);
                IngestOutcome::Accepted { segment_meters }
            }
            None => IngestOutcome::Rejected,
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Hand the points to the caller and start over with an empty path
    pub fn take(&mut self) -> Vec<GeoPoint> {
        std::mem::take(&mut self.points)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::distance_between;
    use crate::metrics::steps_for_segment;
    use approx::assert_relative_eq;

    /// Zig-zag walk with occasional jitter fixes mixed in
    fn noisy_walk() -> Vec<GeoPoint> {
        let mut fixes = Vec::new();
        let mut lat = 45.0;
        let mut lon = 7.0;
        for i in 0..200 {
            let t = i as f64;
            if i % 3 == 0 {
                // jitter: ~0.5 m wobble around the current position
                fixes.push(GeoPoint::new(lat + 0.000004, lon, t));
                continue;
            }
            lat += 0.00001 * (1.0 + (t * 0.7).sin().abs());
            lon += 0.00002 * (t * 0.3).cos();
            fixes.push(GeoPoint::new(lat, lon, t));
        }
        fixes
    }

    #[test]
    fn test_first_sample_is_single_point_with_zero_distance() {
        let mut path = PathAccumulator::new();
        let mut metrics = SessionMetrics::default();

        let outcome = path.ingest(GeoPoint::new(1.0, 1.0, 0.0), &mut metrics);

        assert_eq!(outcome, IngestOutcome::Accepted { segment_meters: 0.0 });
        assert_eq!(path.len(), 1);
        assert_eq!(metrics.total_distance_meters, 0.0);
        assert_eq!(metrics.step_count_estimate, 0);
    }

    #[test]
    fn test_jitter_leaves_state_untouched() {
        let mut path = PathAccumulator::new();
        let mut metrics = SessionMetrics::default();
        path.ingest(GeoPoint::new(0.0, 0.0, 0.0), &mut metrics);
        path.ingest(GeoPoint::new(0.0, 0.0001, 1.0), &mut metrics);
        let before = metrics;

        let outcome = path.ingest(GeoPoint::new(0.0, 0.000105, 2.0), &mut metrics);

        assert_eq!(outcome, IngestOutcome::Rejected);
        assert_eq!(path.len(), 2);
        assert_eq!(metrics, before);
    }

    #[test]
    fn test_distance_is_sum_of_accepted_segments() {
        let mut path = PathAccumulator::new();
        let mut metrics = SessionMetrics::default();
        let mut previous_total = 0.0;
        let mut rejected = 0;

        for fix in noisy_walk() {
            if !path.ingest(fix, &mut metrics).is_accepted() {
                rejected += 1;
            }
            assert!(metrics.total_distance_meters >= previous_total);
            previous_total = metrics.total_distance_meters;
        }
        assert!(rejected > 0);

        let expected: f64 = path
            .points()
            .windows(2)
            .map(|w| distance_between(&w[0], &w[1]))
            .sum();
        assert_relative_eq!(metrics.total_distance_meters, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_steps_reproducible_from_path() {
        let mut path = PathAccumulator::new();
        let mut metrics = SessionMetrics::default();
        for fix in noisy_walk() {
            path.ingest(fix, &mut metrics);
        }

        let from_path: u64 = path
            .points()
            .windows(2)
            .map(|w| steps_for_segment(distance_between(&w[0], &w[1])))
            .sum();
        assert_eq!(metrics.step_count_estimate, from_path);
        assert!(
            metrics.step_count_estimate
                <= steps_for_segment(metrics.total_distance_meters)
        );
    }

    #[test]
    fn test_take_empties_path() {
        let mut path = PathAccumulator::new();
        let mut metrics = SessionMetrics::default();
        path.ingest(GeoPoint::new(0.0, 0.0, 0.0), &mut metrics);
        path.ingest(GeoPoint::new(0.0, 0.001, 60.0), &mut metrics);

        let points = path.take();
        assert_eq!(points.len(), 2);
        assert!(path.is_empty());
        assert!(path.last().is_none());
    }
}
