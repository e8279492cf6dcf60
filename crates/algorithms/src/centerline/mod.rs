//! Centerline extraction
//!
//! Derives the topological midline of a channel polygon from the Voronoi
//! diagram of its densified outline:
//!
//! 1. Fill holes and densify the outline to its mean vertex spacing.
//! 2. Keep finite Voronoi edges lying strictly inside the polygon.
//! 3. Keep edges whose folded bearing differs from the bearing of their
//!    nearest-bank connector by an angle inside the [`BearingWindow`].
//! 4. Merge survivors into chains, drop short chains, snap dangling ends.
//! 5. Extend dangling ends to the outline.

mod bearing;
mod skeleton;

pub use bearing::{bearing, normalize, BearingWindow};

use chanshift_core::{Algorithm, Error, Result};
use geo::{
    Contains, Coord, Euclidean, Length, Line, LineString, MultiLineString, MultiPolygon, Point,
    RemoveRepeatedPoints,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vector::{
    boundary_segments, densify_polygon, fill_holes, nearest_connector, vertex_count, vertex_density,
    voronoi_edges,
};
use skeleton::{
    canonical_orientation, extend_dangling_ends, snap_dangling_ends, to_line_string,
    touches_any, LineGraph,
};

/// Relative size, against the vertex density, under which coordinates merge.
const MERGE_RATIO: f64 = 1e-6;

/// Parameters for centerline extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterlineParams {
    /// Accepted edge/bank bearing differences
    pub bearing_window: BearingWindow,
    /// Chains with fewer vertices are discarded before snapping
    pub min_vertices: usize,
    /// Gap-closing tolerance for dangling ends; `None` uses the vertex density
    pub snap_tolerance: Option<f64>,
}

impl Default for CenterlineParams {
    fn default() -> Self {
        Self {
            bearing_window: BearingWindow::default(),
            min_vertices: 4,
            snap_tolerance: None,
        }
    }
}

/// Channel centerline: one or more line parts and the boundary spacing
/// they were built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Centerline {
    parts: Vec<LineString<f64>>,
    density: Option<f64>,
}

impl Centerline {
    /// Centerline made of a single line, e.g. one supplied by the caller.
    pub fn from_line(line: LineString<f64>) -> Self {
        Self {
            parts: vec![line],
            density: None,
        }
    }

    pub fn from_parts(parts: Vec<LineString<f64>>) -> Self {
        Self { parts, density: None }
    }

    pub fn parts(&self) -> &[LineString<f64>] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Boundary vertex spacing used during extraction
    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Total length of all parts
    pub fn length(&self) -> f64 {
        self.parts.iter().map(|p| p.length::<Euclidean>()).sum()
    }

    /// The only part of the centerline.
    ///
    /// Fails with a topology error when the centerline is empty or branched.
    pub fn single_part(&self) -> Result<&LineString<f64>> {
        match self.parts.as_slice() {
            [line] => Ok(line),
            parts => Err(Error::topology(
                "centerline",
                format!("expected a single line part, found {}", parts.len()),
            )),
        }
    }

    /// The same centerline traced in the opposite direction
    pub fn reversed(&self) -> Self {
        let parts = self
            .parts
            .iter()
            .rev()
            .map(|part| LineString::new(part.0.iter().rev().copied().collect()))
            .collect();
        Self {
            parts,
            density: self.density,
        }
    }

    pub fn to_multi_line_string(&self) -> MultiLineString<f64> {
        MultiLineString::new(self.parts.clone())
    }
}

/// Centerline extraction algorithm
#[derive(Debug, Clone, Default)]
pub struct CenterlineExtractor;

impl Algorithm for CenterlineExtractor {
    type Input = MultiPolygon<f64>;
    type Output = Centerline;
    type Params = CenterlineParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CenterlineExtractor"
    }

    fn description(&self) -> &'static str {
        "Extract the topological centerline of a channel polygon from its Voronoi skeleton"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        extract_centerline(&input, &params)
    }
}

/// Extract the centerline of a channel polygon.
///
/// Holes are ignored. The result may have several parts (braided or
/// composite channels); callers needing one line use
/// [`Centerline::single_part`].
///
/// # Errors
/// * `Topology` when the filled polygon has fewer than 4 vertices or no
///   skeleton line survives pruning
/// * `InvalidParameter` for a non-positive snap tolerance
/// * `GeometryOperation` when hole filling fails
pub fn extract_centerline(polygon: &MultiPolygon<f64>, params: &CenterlineParams) -> Result<Centerline> {
    if let Some(tol) = params.snap_tolerance {
        if !(tol > 0.0) || !tol.is_finite() {
            return Err(Error::invalid_parameter("snap_tolerance", tol, "must be positive"));
        }
    }

    let filled = fill_holes(polygon)?;
    let count = vertex_count(&filled);
    if count < 4 {
        return Err(Error::topology(
            "centerline",
            format!("polygon has {} distinct vertices, at least 4 required", count),
        ));
    }
    let density = vertex_density(&filled)
        .ok_or_else(|| Error::topology("centerline", "polygon has zero perimeter"))?;
    let eps = density * MERGE_RATIO;

    let dense = densify_polygon(&filled, density);
    let outline = boundary_segments(&dense);
    let sites = distinct_vertices(&dense);

    let edges = voronoi_edges(&sites);
    debug!(sites = sites.len(), edges = edges.len(), density, "voronoi skeleton built");

    let kept: Vec<Line<f64>> = edges
        .into_iter()
        .filter(|e| is_interior(e, &filled, &outline))
        .filter(|e| {
            if e.length::<Euclidean>() <= eps {
                // Degenerate edges between cocircular sites only join their neighbours
                return true;
            }
            nearest_connector(e, &outline).map_or(false, |connector| {
                params
                    .bearing_window
                    .keeps(BearingWindow::difference((e.start, e.end), connector))
            })
        })
        .collect();
    debug!(kept = kept.len(), "orientation filter applied");

    let mut graph = LineGraph::new(eps);
    for e in &kept {
        graph.add_segment(e.start, e.end);
    }

    let chains: Vec<Vec<Coord<f64>>> = graph
        .chains()
        .into_iter()
        .map(|ch| LineString::new(ch).remove_repeated_points().0)
        .filter(|ch| ch.len() >= params.min_vertices)
        .collect();
    debug!(edges = graph.edge_count(), chains = chains.len(), "short chains dropped");

    let tolerance = params.snap_tolerance.unwrap_or(density);
    let snapped = snap_dangling_ends(&chains, tolerance, eps);
    let parts: Vec<Vec<Coord<f64>>> = LineGraph::from_chains(&snapped, eps)
        .chains()
        .into_iter()
        .map(|ch| LineString::new(ch).remove_repeated_points().0)
        .filter(|ch| ch.len() >= 2)
        .collect();

    if parts.is_empty() {
        return Err(Error::topology("centerline", "no skeleton line survived pruning"));
    }

    let mut parts: Vec<Vec<Coord<f64>>> = extend_dangling_ends(&parts, &outline, eps)
        .into_iter()
        .map(canonical_orientation)
        .collect();
    parts.sort_by(|a, b| {
        a[0].x
            .total_cmp(&b[0].x)
            .then(a[0].y.total_cmp(&b[0].y))
    });
    debug!(parts = parts.len(), "centerline extracted");

    Ok(Centerline {
        parts: parts.into_iter().map(to_line_string).collect(),
        density: Some(density),
    })
}

fn distinct_vertices(mp: &MultiPolygon<f64>) -> Vec<Coord<f64>> {
    let mut seen = std::collections::HashSet::new();
    mp.0.iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.0.iter().copied())
        .filter(|c| seen.insert((c.x.to_bits(), c.y.to_bits())))
        .collect()
}

/// Both endpoints strictly inside and no contact with the outline.
fn is_interior(e: &Line<f64>, filled: &MultiPolygon<f64>, outline: &[Line<f64>]) -> bool {
    filled.contains(&Point::from(e.start))
        && filled.contains(&Point::from(e.end))
        && !touches_any(e, outline)
}
