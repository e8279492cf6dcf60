//! Linear referencing along a line string

use geo::{Coord, Distance, Euclidean, Length, LineInterpolatePoint, LineLocatePoint, LineString, Point};

/// Point at `d` units from the start, clamped to the line.
pub fn point_at_distance(line: &LineString<f64>, d: f64) -> Option<Coord<f64>> {
    let first = *line.0.first()?;
    let total = line.length::<Euclidean>();
    if d <= 0.0 || total <= 0.0 {
        return Some(first);
    }
    line.line_interpolate_point((d / total).min(1.0)).map(|p| p.0)
}

/// Portion of the line between distances `from` and `to` (`from <= to`).
pub fn substring(line: &LineString<f64>, from: f64, to: f64) -> LineString<f64> {
    let total = line.length::<Euclidean>();
    let from = from.clamp(0.0, total);
    let to = to.clamp(from, total);

    let mut out: Vec<Coord<f64>> = point_at_distance(line, from).into_iter().collect();
    let mut walked = 0.0;
    for segment in line.lines() {
        walked += Euclidean::distance(segment.start, segment.end);
        if walked > from && walked < to {
            out.push(segment.end);
        }
    }
    out.extend(point_at_distance(line, to));

    let mut sub = LineString::new(out);
    sub.0.dedup();
    if sub.0.len() == 1 {
        sub.0.push(sub.0[0]);
    }
    sub
}

/// Distance along `line` of its point closest to `p`.
pub fn locate(line: &LineString<f64>, p: Coord<f64>) -> f64 {
    line.line_locate_point(&Point::from(p))
        .map_or(0.0, |fraction| fraction * line.length::<Euclidean>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_line() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
    }

    #[test]
    fn test_point_at_distance_turns_corner() {
        let p = point_at_distance(&l_line(), 15.0).unwrap();
        assert!((p.x - 10.0).abs() < 1e-12 && (p.y - 5.0).abs() < 1e-12);
        assert_eq!(point_at_distance(&l_line(), 99.0).unwrap(), Coord { x: 10.0, y: 10.0 });
        assert_eq!(point_at_distance(&l_line(), -1.0).unwrap(), Coord { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_substring_keeps_inner_vertex() {
        let sub = substring(&l_line(), 5.0, 15.0);
        let coords: Vec<(f64, f64)> = sub.0.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords, vec![(5.0, 0.0), (10.0, 0.0), (10.0, 5.0)]);
        assert!((sub.length::<Euclidean>() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_locate_projection() {
        assert!((locate(&l_line(), Coord { x: 12.0, y: 3.0 }) - 13.0).abs() < 1e-12);
        assert_eq!(locate(&l_line(), Coord { x: -4.0, y: 0.0 }), 0.0);
    }
}
