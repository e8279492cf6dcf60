//! Left/right bank masks of a channel envelope relative to a centerline
//!
//! The centerline is first anchored to the envelope outline so that it cuts
//! the envelope part it runs through in two. The counter-clockwise outline is
//! then split at the two anchor points; the centerline closed by each arc
//! gives one bank polygon, and the one with positive signed area lies to the
//! left of the flow direction. Envelope parts the centerline never reaches go
//! to the side of the centerline they face.

use chanshift_core::{Error, Result, Side};
use geo::algorithm::orient::{Direction as Winding, Orient};
use geo::{Area, Contains, Coord, Distance, Euclidean, Intersects, Length, LineString, MultiPolygon, Point, Polygon};
use tracing::debug;

use crate::vector::{
    boundary_segments, cross, difference, interior_point, intersection,
    locate, point_at_distance, snap_to_segments, substring,
};

/// Envelope split into the two banks of one centerline
#[derive(Debug, Clone, PartialEq)]
pub struct SideMask {
    pub left: MultiPolygon<f64>,
    pub right: MultiPolygon<f64>,
}

impl SideMask {
    pub fn side(&self, side: Side) -> &MultiPolygon<f64> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Extend the centerline so both ends lie on the envelope outline.
///
/// Each end is snapped to its nearest outline point; the snapped point is
/// prepended (start) or appended (end) when it differs from the existing end vertex.
pub fn anchor_centerline(line: &LineString<f64>, envelope: &MultiPolygon<f64>) -> Result<LineString<f64>> {
    let (first, last) = match (line.0.first(), line.0.last()) {
        (Some(&f), Some(&l)) if line.0.len() >= 2 => (f, l),
        _ => return Err(Error::topology("side mask", "centerline has fewer than two vertices")),
    };
    let outline = boundary_segments(envelope);
    let snap = |p: Coord<f64>| {
        snap_to_segments(p, &outline)
            .ok_or_else(|| Error::topology("side mask", "channel envelope is empty"))
    };
    let start = snap(first)?;
    let end = snap(last)?;

    let mut coords = Vec::with_capacity(line.0.len() + 2);
    if start != first {
        coords.push(start);
    }
    coords.extend_from_slice(&line.0);
    if end != last {
        coords.push(end);
    }
    Ok(LineString::new(coords))
}

/// Forward walk along a closed ring from `from` to `to` (along-ring
/// distances), wrapping through the ring start when needed.
fn ring_arc(ring: &LineString<f64>, from: f64, to: f64) -> Vec<Coord<f64>> {
    let mut coords = if to >= from {
        substring(ring, from, to).0
    } else {
        let total = ring.length::<Euclidean>();
        let mut head = substring(ring, from, total).0;
        head.extend(substring(ring, 0.0, to).0);
        head
    };
    coords.dedup();
    coords
}

fn closed_polygon(mut coords: Vec<Coord<f64>>) -> Polygon<f64> {
    coords.dedup();
    Polygon::new(LineString::new(coords), vec![])
}

/// Side of `p` relative to the nearest segment of `line`.
fn facing_side(line: &LineString<f64>, p: Coord<f64>) -> Side {
    let nearest = line
        .lines()
        .map(|seg| (seg, Euclidean::distance(&Point::from(p), &seg)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    match nearest {
        Some((seg, _)) if cross(seg.delta(), p - seg.start) < 0.0 => Side::Right,
        _ => Side::Left,
    }
}

fn host_part(parts: &[Polygon<f64>], line: &LineString<f64>) -> Option<usize> {
    let mid = point_at_distance(line, line.length::<Euclidean>() / 2.0)?;
    parts
        .iter()
        .position(|p| p.intersects(&mid))
        .or_else(|| parts.iter().position(|p| p.intersects(line)))
}

/// Split `envelope` into left and right banks of an anchored centerline.
///
/// # Errors
/// * `Topology` when the centerline misses the envelope or both anchors
///   coincide
/// * `GeometryOperation` when the overlay fallback fails
pub fn side_mask(line: &LineString<f64>, envelope: &MultiPolygon<f64>) -> Result<SideMask> {
    let oriented = envelope.orient(Winding::Default);
    let parts = &oriented.0;
    let host = host_part(parts, line)
        .ok_or_else(|| Error::topology("side mask", "centerline does not touch the channel envelope"))?;
    let part = &parts[host];
    let ring = part.exterior();

    let (u0, un) = match (line.0.first(), line.0.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return Err(Error::topology("side mask", "centerline is empty")),
    };
    let s0 = locate(ring, u0);
    let sn = locate(ring, un);
    let scale = ring.length::<Euclidean>().max(1.0);
    if (s0 - sn).abs() <= 1e-9 * scale {
        return Err(Error::topology("side mask", "centerline ends meet on the envelope outline"));
    }

    // Centerline forward, then back along the outline either way round
    let mut pa = line.0.clone();
    pa.extend(ring_arc(ring, sn, s0));
    let mut pb = line.0.clone();
    let mut back = ring_arc(ring, s0, sn);
    back.reverse();
    pb.extend(back);

    let pa = closed_polygon(pa);
    let pb = closed_polygon(pb);
    let pa_is_left = pa.signed_area() > 0.0;

    let part_mp = MultiPolygon::new(vec![part.clone()]);
    let (mut left, mut right) = if part.contains(line) {
        if pa_is_left {
            (MultiPolygon::new(vec![pa]), MultiPolygon::new(vec![pb]))
        } else {
            (MultiPolygon::new(vec![pb]), MultiPolygon::new(vec![pa]))
        }
    } else {
        debug!("centerline leaves its envelope part, splitting by overlay");
        let candidate = intersection(&MultiPolygon::new(vec![pa]), &part_mp)?;
        let rest = difference(&part_mp, &candidate)?;
        if pa_is_left {
            (candidate, rest)
        } else {
            (rest, candidate)
        }
    };

    for (i, other) in parts.iter().enumerate() {
        if i == host {
            continue;
        }
        let Some(p) = interior_point(other) else {
            continue;
        };
        match facing_side(line, p.0) {
            Side::Left => left.0.push(other.clone()),
            Side::Right => right.0.push(other.clone()),
        }
    }

    Ok(SideMask { left, right })
}

/// Anchor a single-part centerline and split the envelope by it.
pub fn bank_sides(line: &LineString<f64>, envelope: &MultiPolygon<f64>) -> Result<SideMask> {
    let anchored = anchor_centerline(line, envelope)?;
    side_mask(&anchored, envelope)
}
