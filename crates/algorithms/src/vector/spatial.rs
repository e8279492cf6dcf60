//! Extents and interior points

use geo::{BoundingRect, Coord, Geometry, InteriorPoint, Point, Polygon, Rect};

/// Bounding rectangle of `geom`, grown by `margin` on every side.
///
/// `None` for empty geometries.
pub fn extent(geom: &Geometry<f64>, margin: f64) -> Option<Rect<f64>> {
    let rect = geom.bounding_rect()?;
    let pad = Coord { x: margin, y: margin };
    Some(Rect::new(rect.min() - pad, rect.max() + pad))
}

/// A point guaranteed to lie inside the polygon, when it has any area.
pub fn interior_point(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.interior_point()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, LineString, MultiPolygon};

    fn u_shape() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (8.0, 10.0),
                (8.0, 2.0), (2.0, 2.0), (2.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_extent_of_multipolygon() {
        let mp = MultiPolygon::new(vec![u_shape()]);
        let rect = extent(&Geometry::MultiPolygon(mp), 0.0).unwrap();
        assert_eq!(rect, Rect::new((0.0, 0.0), (10.0, 10.0)));
    }

    #[test]
    fn test_extent_margin() {
        let rect = extent(&Geometry::Polygon(u_shape()), 1.0).unwrap();
        assert_eq!(rect.min(), Coord { x: -1.0, y: -1.0 });
        assert!((rect.unsigned_area() - 144.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_geometry_has_no_extent() {
        assert!(extent(&Geometry::MultiPolygon(MultiPolygon::new(vec![])), 5.0).is_none());
    }

    #[test]
    fn test_interior_point_of_concave_polygon() {
        let poly = u_shape();
        let p = interior_point(&poly).unwrap();
        assert!(poly.contains(&p));
    }
}
