//! Voronoi (Thiessen) construction
//!
//! Skeleton edges come from the dual of a Delaunay triangulation built with
//! the incremental Bowyer-Watson algorithm: every interior Delaunay edge
//! shared by two triangles yields the Voronoi edge joining their circumcenters.
//! Hull edges would yield unbounded rays and are not reported.
//!
//! Thiessen cells for a handful of generator points are cut directly out of a
//! bounding extent with bisector half-planes.

use std::collections::BTreeMap;

use geo::{Coord, Line, Polygon, Rect};

use super::clip::{clip_convex, HalfPlane};

/// A triangle defined by three vertex indices and its circumcircle
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    center: Option<Coord<f64>>,
    radius_sq: f64,
}

impl Triangle {
    fn new(v: [usize; 3], vertices: &[Coord<f64>]) -> Self {
        match circumcircle(vertices[v[0]], vertices[v[1]], vertices[v[2]]) {
            Some((center, radius_sq)) => Self { v, center: Some(center), radius_sq },
            None => Self { v, center: None, radius_sq: 0.0 },
        }
    }

    fn edges(&self) -> [(usize, usize); 3] {
        [(self.v[0], self.v[1]), (self.v[1], self.v[2]), (self.v[2], self.v[0])]
    }

    fn in_circumcircle(&self, p: Coord<f64>) -> bool {
        match self.center {
            Some(c) => {
                let dx = p.x - c.x;
                let dy = p.y - c.y;
                dx * dx + dy * dy <= self.radius_sq
            }
            None => false,
        }
    }
}

/// Circumcenter and squared radius of three points
fn circumcircle(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> Option<(Coord<f64>, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;

    let dx = a.x - ux;
    let dy = a.y - uy;
    Some((Coord { x: ux, y: uy }, dx * dx + dy * dy))
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Build the Delaunay triangulation of distinct points (Bowyer-Watson).
///
/// Returned triangles index into `points`.
fn delaunay(points: &[Coord<f64>]) -> Vec<Triangle> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let dx = max_x - min_x;
    let dy = max_y - min_y;
    let delta = dx.max(dy).max(1.0);

    // Super-triangle far enough out that its circumcircles do not clip the hull
    let mut vertices: Vec<Coord<f64>> = vec![
        Coord { x: min_x - 100.0 * delta, y: min_y - 100.0 * delta },
        Coord { x: min_x + 0.5 * dx, y: max_y + 100.0 * delta },
        Coord { x: max_x + 100.0 * delta, y: min_y - 100.0 * delta },
    ];
    vertices.extend_from_slice(points);

    let mut triangles = vec![Triangle::new([0, 1, 2], &vertices)];

    for vi in 3..vertices.len() {
        let point = vertices[vi];

        let bad: Vec<usize> = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.in_circumcircle(point))
            .map(|(i, _)| i)
            .collect();

        // Cavity boundary: edges used by exactly one bad triangle
        let mut edge_use: BTreeMap<(usize, usize), (usize, usize, usize)> = BTreeMap::new();
        for &bi in &bad {
            for (ea, eb) in triangles[bi].edges() {
                let entry = edge_use.entry(edge_key(ea, eb)).or_insert((ea, eb, 0));
                entry.2 += 1;
            }
        }

        let mut bad_sorted = bad;
        bad_sorted.sort_unstable_by(|a, b| b.cmp(a));
        for bi in bad_sorted {
            triangles.swap_remove(bi);
        }

        for (ea, eb, count) in edge_use.into_values() {
            if count == 1 {
                triangles.push(Triangle::new([ea, eb, vi], &vertices));
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&v| v >= 3))
        .map(|t| Triangle {
            v: [t.v[0] - 3, t.v[1] - 3, t.v[2] - 3],
            ..t
        })
        .collect()
}

/// Finite Voronoi edges of a point set.
///
/// Points must be distinct. Edges come out in a deterministic order; an edge
/// whose endpoints coincide (cocircular generators) is still reported.
pub fn voronoi_edges(points: &[Coord<f64>]) -> Vec<Line<f64>> {
    let triangles = delaunay(points);

    let mut shared: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (ti, tri) in triangles.iter().enumerate() {
        for (a, b) in tri.edges() {
            shared.entry(edge_key(a, b)).or_default().push(ti);
        }
    }

    shared
        .into_values()
        .filter(|tris| tris.len() == 2)
        .filter_map(|tris| {
            let a = triangles[tris[0]].center?;
            let b = triangles[tris[1]].center?;
            Some(Line::new(a, b))
        })
        .collect()
}

/// Thiessen cell of every site, restricted to `extent`.
///
/// Cells are returned in site order; a site whose cell vanishes (duplicate
/// site, site outside the extent) gets `None`.
pub fn voronoi_cells(sites: &[Coord<f64>], extent: &Rect<f64>) -> Vec<Option<Polygon<f64>>> {
    let frame = extent.to_polygon();
    sites
        .iter()
        .enumerate()
        .map(|(i, &site)| {
            let planes: Vec<HalfPlane> = sites
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && *other != site)
                .map(|(_, &other)| HalfPlane::closer_to(site, other))
                .collect();
            clip_convex(&frame, &planes)
        })
        .collect()
}
