//! Nearest-feature queries, segment intersection and ray casting

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Closest, ClosestPoint, Coord, Distance, Euclidean, Line, MultiPolygon, Point};

const PARALLEL_EPS: f64 = 1e-12;

/// Every ring segment (exterior and interior) of every part.
pub fn boundary_segments(mp: &MultiPolygon<f64>) -> Vec<Line<f64>> {
    mp.0.iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.lines())
        .filter(|l| l.start != l.end)
        .collect()
}

/// Closest point to `p` on segment `seg`.
pub fn closest_point_on_segment(p: Coord<f64>, seg: &Line<f64>) -> Coord<f64> {
    match seg.closest_point(&Point::from(p)) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => q.0,
        // Zero-length segment
        Closest::Indeterminate => seg.start,
    }
}

/// Intersection of two closed segments.
///
/// Collinear overlapping segments report the start of the overlap.
pub fn segment_intersection(a: &Line<f64>, b: &Line<f64>) -> Option<Coord<f64>> {
    match line_intersection(*a, *b)? {
        LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
        LineIntersection::Collinear { intersection } => Some(intersection.start),
    }
}

/// Closest pair of points between two segments: `(on a, on b)`.
pub fn closest_points(a: &Line<f64>, b: &Line<f64>) -> (Coord<f64>, Coord<f64>) {
    if let Some(x) = segment_intersection(a, b) {
        return (x, x);
    }

    [
        (a.start, closest_point_on_segment(a.start, b)),
        (a.end, closest_point_on_segment(a.end, b)),
        (closest_point_on_segment(b.start, a), b.start),
        (closest_point_on_segment(b.end, a), b.end),
    ]
    .into_iter()
    .min_by(|x, y| Euclidean::distance(x.0, x.1).total_cmp(&Euclidean::distance(y.0, y.1)))
    .unwrap_or((a.start, b.start))
}

/// Shortest connector from `edge` to any of `targets`: `(on edge, on target)`.
pub fn nearest_connector(edge: &Line<f64>, targets: &[Line<f64>]) -> Option<(Coord<f64>, Coord<f64>)> {
    let mut best: Option<(Coord<f64>, Coord<f64>, f64)> = None;
    for target in targets {
        let (p, q) = closest_points(edge, target);
        let d = Euclidean::distance(p, q);
        if best.map_or(true, |(_, _, bd)| d < bd) {
            best = Some((p, q, d));
        }
    }
    best.map(|(p, q, _)| (p, q))
}

/// Nearest point to `p` on any of `targets`.
pub fn snap_to_segments(p: Coord<f64>, targets: &[Line<f64>]) -> Option<Coord<f64>> {
    targets
        .iter()
        .map(|seg| closest_point_on_segment(p, seg))
        .min_by(|a, b| Euclidean::distance(p, *a).total_cmp(&Euclidean::distance(p, *b)))
}

/// First hit of the ray `origin + t·dir` (t > `min_t`) on any of `targets`.
///
/// Returns the hit point and its ray parameter. `dir` need not be normalized.
pub fn ray_hit(
    origin: Coord<f64>,
    dir: Coord<f64>,
    targets: &[Line<f64>],
    min_t: f64,
) -> Option<(Coord<f64>, f64)> {
    let mut best: Option<(Coord<f64>, f64)> = None;
    for seg in targets {
        let s = seg.delta();
        let denom = cross(dir, s);
        if denom.abs() <= PARALLEL_EPS {
            continue;
        }
        let qp = seg.start - origin;
        let t = cross(qp, s) / denom;
        let u = cross(qp, dir) / denom;
        if t > min_t && (-1e-12..=1.0 + 1e-12).contains(&u) && best.map_or(true, |(_, bt)| t < bt) {
            best = Some((
                Coord {
                    x: origin.x + t * dir.x,
                    y: origin.y + t * dir.y,
                },
                t,
            ));
        }
    }
    best
}

/// Signed area of the parallelogram `a × b`.
pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn test_segment_intersection_crossing() {
        let a = Line::new(c(0.0, 0.0), c(10.0, 10.0));
        let b = Line::new(c(0.0, 10.0), c(10.0, 0.0));
        let x = segment_intersection(&a, &b).unwrap();
        assert!((x.x - 5.0).abs() < 1e-12 && (x.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_intersection_touching_and_disjoint() {
        let a = Line::new(c(0.0, 0.0), c(10.0, 0.0));
        assert!(segment_intersection(&a, &Line::new(c(10.0, 0.0), c(10.0, 5.0))).is_some());
        assert!(segment_intersection(&a, &Line::new(c(0.0, 1.0), c(10.0, 1.0))).is_none());
        assert!(segment_intersection(&a, &Line::new(c(11.0, 0.0), c(12.0, 0.0))).is_none());
    }

    #[test]
    fn test_collinear_overlap_and_degenerate_segment() {
        let a = Line::new(c(0.0, 0.0), c(10.0, 0.0));
        let overlap = segment_intersection(&a, &Line::new(c(5.0, 0.0), c(15.0, 0.0))).unwrap();
        assert_eq!(overlap.y, 0.0);
        assert!(overlap.x >= 5.0 && overlap.x <= 10.0);

        let point = Line::new(c(2.0, 2.0), c(2.0, 2.0));
        assert_eq!(closest_point_on_segment(c(7.0, 9.0), &point), c(2.0, 2.0));
        assert_eq!(closest_point_on_segment(c(-3.0, 1.0), &a), c(0.0, 0.0));
    }

    #[test]
    fn test_nearest_connector_is_perpendicular() {
        let bank = polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 20.0), (x: 0.0, y: 20.0), (x: 0.0, y: 0.0),
        ];
        let segs = boundary_segments(&MultiPolygon::new(vec![bank]));
        let edge = Line::new(c(40.0, 8.0), c(42.0, 8.0));
        let (p, q) = nearest_connector(&edge, &segs).unwrap();
        assert!((p.y - 8.0).abs() < 1e-12);
        assert!(q.y.abs() < 1e-12);
        assert!((p.x - q.x).abs() < 1e-12);
    }

    #[test]
    fn test_snap_to_segments() {
        let segs = vec![Line::new(c(0.0, 0.0), c(10.0, 0.0))];
        let p = snap_to_segments(c(3.0, 4.0), &segs).unwrap();
        assert_eq!(p, c(3.0, 0.0));
    }

    #[test]
    fn test_ray_hit_takes_first_target() {
        let targets = vec![
            Line::new(c(10.0, -5.0), c(10.0, 5.0)),
            Line::new(c(4.0, -5.0), c(4.0, 5.0)),
        ];
        let (hit, t) = ray_hit(c(0.0, 0.0), c(1.0, 0.0), &targets, 0.0).unwrap();
        assert_eq!(hit, c(4.0, 0.0));
        assert!((t - 4.0).abs() < 1e-12);
        assert!(ray_hit(c(0.0, 0.0), c(-1.0, 0.0), &targets, 0.0).is_none());
    }
}
