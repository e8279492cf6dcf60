//! Boundary densification

use geo::{Densify, Euclidean, MultiPolygon};

/// Insert vertices so that no ring segment is longer than `max_spacing`.
///
/// A segment of length `l > max_spacing` is split into `ceil(l / max_spacing)`
/// equal pieces; shorter segments are left untouched. A non-positive or
/// non-finite spacing returns the input unchanged.
pub fn densify_polygon(mp: &MultiPolygon<f64>, max_spacing: f64) -> MultiPolygon<f64> {
    if !(max_spacing > 0.0) || !max_spacing.is_finite() {
        return mp.clone();
    }
    mp.densify::<Euclidean>(max_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Distance, LineString, Polygon};

    fn strip() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn test_long_side_is_split_evenly() {
        let dense = densify_polygon(&strip(), 3.0);
        let ring = dense.0[0].exterior();
        // ceil(10 / 3) = 4 pieces on each long side, short sides untouched
        assert_eq!(ring.0.len(), 4 + 1 + 4 + 1 + 1);
        assert!((ring.0[1].x - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_segment_exceeds_spacing() {
        let ring = LineString::from(vec![(0.0, 0.0), (7.3, 0.0), (7.3, 4.1), (0.0, 0.0)]);
        let dense = densify_polygon(&MultiPolygon::new(vec![Polygon::new(ring, vec![])]), 1.0);
        let out = dense.0[0].exterior();
        for w in out.0.windows(2) {
            assert!(Euclidean::distance(w[0], w[1]) <= 1.0 + 1e-9);
        }
        assert_eq!(out.0.first(), out.0.last());
    }

    #[test]
    fn test_zero_spacing_is_a_no_op() {
        assert_eq!(densify_polygon(&strip(), 0.0), strip());
    }
}
