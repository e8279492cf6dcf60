//! Convex clipping
//!
//! Sutherland-Hodgman clipping of a convex ring against a sequence of
//! half-planes. Used to cut Voronoi cells out of a bounding extent.

use geo::{Coord, LineString, Polygon};

/// Closed half-plane `a·x + b·y <= c`
#[derive(Debug, Clone, Copy)]
pub struct HalfPlane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl HalfPlane {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Points at least as close to `site` as to `other`.
    pub fn closer_to(site: Coord<f64>, other: Coord<f64>) -> Self {
        let a = other.x - site.x;
        let b = other.y - site.y;
        let c = (other.x * other.x + other.y * other.y - site.x * site.x - site.y * site.y) / 2.0;
        Self { a, b, c }
    }

    fn eval(&self, p: &Coord<f64>) -> f64 {
        self.a * p.x + self.b * p.y - self.c
    }

    fn is_inside(&self, p: &Coord<f64>) -> bool {
        self.eval(p) <= 0.0
    }

    fn intersect(&self, p: &Coord<f64>, q: &Coord<f64>) -> Coord<f64> {
        let fp = self.eval(p);
        let fq = self.eval(q);
        let t = fp / (fp - fq);
        Coord {
            x: p.x + t * (q.x - p.x),
            y: p.y + t * (q.y - p.y),
        }
    }
}

/// Clip an open vertex ring against one half-plane (Sutherland-Hodgman step)
fn clip_ring_plane(vertices: &[Coord<f64>], plane: &HalfPlane) -> Vec<Coord<f64>> {
    let n = vertices.len();
    let mut output = Vec::with_capacity(n + 1);

    for i in 0..n {
        let current = &vertices[i];
        let next = &vertices[(i + 1) % n];

        match (plane.is_inside(current), plane.is_inside(next)) {
            (true, true) => output.push(*next),
            (true, false) => output.push(plane.intersect(current, next)),
            (false, true) => {
                output.push(plane.intersect(current, next));
                output.push(*next);
            }
            (false, false) => {}
        }
    }

    output
}

/// Clip a convex polygon by a set of half-planes.
///
/// Returns `None` when nothing with positive extent is left.
pub fn clip_convex<'a, I>(polygon: &Polygon<f64>, planes: I) -> Option<Polygon<f64>>
where
    I: IntoIterator<Item = &'a HalfPlane>,
{
    let mut vertices: Vec<Coord<f64>> = polygon.exterior().0.to_vec();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    for plane in planes {
        vertices = clip_ring_plane(&vertices, plane);
        if vertices.len() < 3 {
            return None;
        }
    }

    vertices.push(vertices[0]);
    Some(Polygon::new(LineString::new(vertices), vec![]))
}
