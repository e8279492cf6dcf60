//! Boundary measurements used to pick a densification step

use geo::{Euclidean, Length, LineString, MultiPolygon, Polygon};

/// Length of every ring, holes included.
pub fn perimeter(mp: &MultiPolygon<f64>) -> f64 {
    mp.0.iter().flat_map(rings).map(|ring| ring.length::<Euclidean>()).sum()
}

/// Distinct ring vertices. The closing vertex and consecutive repeats are
/// not counted.
pub fn vertex_count(mp: &MultiPolygon<f64>) -> usize {
    mp.0.iter().flat_map(rings).map(distinct_vertices).sum()
}

/// Mean spacing of boundary vertices, `None` for degenerate input.
pub fn vertex_density(mp: &MultiPolygon<f64>) -> Option<f64> {
    let vertices = vertex_count(mp);
    let boundary = perimeter(mp);
    (vertices > 0 && boundary > 0.0).then(|| boundary / vertices as f64)
}

fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

fn distinct_vertices(ring: &LineString<f64>) -> usize {
    let mut n = ring.0.windows(2).filter(|w| w[0] != w[1]).count() + usize::from(!ring.0.is_empty());
    if n > 1 && ring.is_closed() {
        n -= 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn square(size: f64) -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: size), (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn test_perimeter_counts_holes() {
        let hole = LineString::from(vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0)]);
        let poly = Polygon::new(square(10.0).exterior().clone(), vec![hole]);
        assert_relative_eq!(perimeter(&MultiPolygon::new(vec![poly])), 64.0);
    }

    #[test]
    fn test_repeated_vertices_are_ignored() {
        let ring = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let mp = MultiPolygon::new(vec![Polygon::new(ring, vec![])]);
        assert_eq!(vertex_count(&mp), 4);
        assert_relative_eq!(vertex_density(&mp).unwrap(), 4.0);
    }

    #[test]
    fn test_density_of_square() {
        let mp = MultiPolygon::new(vec![square(10.0)]);
        assert_eq!(vertex_count(&mp), 4);
        assert_relative_eq!(vertex_density(&mp).unwrap(), 10.0);
    }

    #[test]
    fn test_density_of_empty_polygon() {
        assert!(vertex_density(&MultiPolygon::new(vec![])).is_none());
    }
}
