//! Centerline segmentation
//!
//! Cuts a centerline into pieces of a fixed along-line interval and gives each
//! piece a region: the Thiessen cell of the piece midpoint, clipped to the
//! channel polygon. Sequence ids count down along the line, so the piece at
//! the line start carries the largest id.

use chanshift_core::{Algorithm, Error, Feature, Result};
use geo::{Coord, Euclidean, Geometry, Length, LineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::centerline::Centerline;
use crate::vector::{
    extent, intersection, point_at_distance, simplify_dp, substring, voronoi_cells,
};

/// Parameters for segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Along-line segment length (CRS units)
    pub interval: f64,
    /// Douglas-Peucker tolerance applied to the centerline first; 0 disables
    pub simplification: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            interval: 100.0,
            simplification: 0.0,
        }
    }
}

impl SegmentParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval > 0.0) || !self.interval.is_finite() {
            return Err(Error::invalid_parameter("interval", self.interval, "must be a positive length"));
        }
        if !(self.simplification >= 0.0) || !self.simplification.is_finite() {
            return Err(Error::invalid_parameter(
                "simplification",
                self.simplification,
                "must be zero or a positive tolerance",
            ));
        }
        Ok(())
    }

    /// Radius within which a cut merges with its predecessor or the line end.
    pub fn snap_radius(&self) -> f64 {
        if self.interval > 2.0 {
            1.0
        } else {
            self.interval / 5.0
        }
    }
}

/// One piece of a segmented centerline
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Sequence id (`ID_SEQ`)
    pub id: usize,
    /// The centerline piece
    pub line: LineString<f64>,
    /// Thiessen cell of the piece midpoint, clipped to the channel
    pub cell: MultiPolygon<f64>,
    /// Segmentation interval (`Distance`)
    pub distance: f64,
}

impl Segment {
    /// Cell feature with `ID_SEQ` and `Distance`
    pub fn to_feature(&self) -> Feature {
        Feature::new(Geometry::MultiPolygon(self.cell.clone()))
            .with_property("ID_SEQ", self.id as i64)
            .with_property("Distance", self.distance)
    }
}

/// Segmentation algorithm
#[derive(Debug, Clone, Default)]
pub struct Segmenter;

impl Algorithm for Segmenter {
    type Input = (Centerline, MultiPolygon<f64>);
    type Output = Vec<Segment>;
    type Params = SegmentParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Segmenter"
    }

    fn description(&self) -> &'static str {
        "Split a centerline at a fixed interval and build a Thiessen cell per piece"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        segment_centerline(&input.0, &input.1, &params)
    }
}

/// Sequence ids of `n` points along a line: `n - 1 - index`.
pub fn sequence_ids(n: usize) -> Vec<usize> {
    (0..n).map(|i| n - 1 - i).collect()
}

/// Along-line positions of the sampling points: every `interval` from the
/// start, plus the end point.
fn sample_positions(length: f64, interval: f64) -> Vec<f64> {
    let mut positions = Vec::new();
    let mut d = 0.0;
    let mut k = 0usize;
    while d < length - 1e-9 * length.max(1.0) {
        positions.push(d);
        k += 1;
        d = k as f64 * interval;
    }
    positions.push(length);
    positions
}

/// Split the centerline into interval pieces with their cells.
///
/// # Errors
/// * `InvalidParameter` for a non-positive interval or a negative tolerance
/// * `Topology` when the centerline is not a single part or has no length
/// * `GeometryOperation` when clipping a cell to the channel fails
pub fn segment_centerline(
    centerline: &Centerline,
    channel: &MultiPolygon<f64>,
    params: &SegmentParams,
) -> Result<Vec<Segment>> {
    params.validate()?;

    let line = simplify_dp(centerline.single_part()?, params.simplification);
    let length = line.length::<Euclidean>();
    if !(length > 0.0) {
        return Err(Error::topology("segmentation", "centerline has zero length"));
    }

    let positions = sample_positions(length, params.interval);
    let ids = sequence_ids(positions.len());
    let radius = params.snap_radius();

    let mut cuts = vec![0.0];
    for &d in positions.iter().skip(1) {
        let prev = cuts.last().copied().unwrap_or(0.0);
        if d - prev >= radius && length - d >= radius {
            cuts.push(d);
        }
    }
    cuts.push(length);

    let tol = 1e-9 * length.max(1.0);
    let pieces: Vec<(LineString<f64>, usize)> = cuts
        .windows(2)
        .map(|w| {
            let id = positions
                .iter()
                .zip(&ids)
                .filter(|(&d, _)| d >= w[0] - tol && d <= w[1] + tol)
                .map(|(_, &id)| id)
                .max()
                .unwrap_or(0);
            (substring(&line, w[0], w[1]), id)
        })
        .collect();

    let midpoints: Vec<Coord<f64>> = pieces
        .iter()
        .filter_map(|(piece, _)| point_at_distance(piece, piece.length::<Euclidean>() / 2.0))
        .collect();

    let extent = extent(&Geometry::MultiPolygon(channel.clone()), 0.0)
        .ok_or_else(|| Error::topology("segmentation", "channel polygon is empty"))?;
    let cells = voronoi_cells(&midpoints, &extent);

    let segments = pieces
        .into_iter()
        .zip(cells)
        .map(|((line, id), cell)| {
            let cell = match cell {
                Some(cell) => intersection(&MultiPolygon::new(vec![cell]), channel)?,
                None => MultiPolygon::new(vec![]),
            };
            Ok(Segment {
                id,
                line,
                cell,
                distance: params.interval,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(points = positions.len(), segments = segments.len(), "centerline segmented");
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, Area};

    fn channel() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 20.0), (x: 0.0, y: 20.0), (x: 0.0, y: 0.0),
        ]])
    }

    fn axis() -> Centerline {
        Centerline::from_line(LineString::from(vec![(0.0, 10.0), (100.0, 10.0)]))
    }

    fn params(interval: f64) -> SegmentParams {
        SegmentParams {
            interval,
            simplification: 0.0,
        }
    }

    #[test]
    fn test_sequence_ids_count_down() {
        assert_eq!(sequence_ids(5), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_snap_radius() {
        assert_relative_eq!(params(10.0).snap_radius(), 1.0);
        assert_relative_eq!(params(2.0).snap_radius(), 0.4);
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let err = segment_centerline(&axis(), &channel(), &params(0.0)).unwrap_err();
        assert_eq!(err.kind(), chanshift_core::ErrorKind::Configuration);
        let neg = SegmentParams {
            interval: 10.0,
            simplification: -1.0,
        };
        assert!(segment_centerline(&axis(), &channel(), &neg).is_err());
    }

    #[test]
    fn test_even_split_covers_channel() {
        let segs = segment_centerline(&axis(), &channel(), &params(25.0)).unwrap();
        assert_eq!(segs.len(), 4);
        let ids: Vec<usize> = segs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);

        let total: f64 = segs.iter().map(|s| s.cell.unsigned_area()).sum();
        assert_relative_eq!(total, 2000.0, epsilon = 1e-6);
        for s in &segs {
            assert_relative_eq!(s.cell.unsigned_area(), 500.0, epsilon = 1e-6);
            assert_relative_eq!(s.distance, 25.0);
        }
    }

    #[test]
    fn test_short_tail_merges_into_last_piece() {
        // The point at 99.6 lies within the 1-unit radius of the line end
        let segs = segment_centerline(&axis(), &channel(), &params(33.2)).unwrap();
        assert_eq!(segs.len(), 3);
        assert_relative_eq!(segs[2].line.length::<Euclidean>(), 33.6, epsilon = 1e-9);
        assert_eq!(segs[2].id, 2);
    }

    #[test]
    fn test_small_interval_keeps_cuts() {
        let line = Centerline::from_line(LineString::from(vec![(0.0, 10.0), (10.0, 10.0)]));
        let segs = segment_centerline(&line, &channel(), &params(1.0)).unwrap();
        assert_eq!(segs.len(), 10);
    }

    #[test]
    fn test_branched_centerline_is_rejected() {
        let cl = Centerline::from_parts(vec![
            LineString::from(vec![(0.0, 10.0), (50.0, 10.0)]),
            LineString::from(vec![(50.0, 10.0), (100.0, 15.0)]),
        ]);
        let err = segment_centerline(&cl, &channel(), &params(10.0)).unwrap_err();
        assert_eq!(err.kind(), chanshift_core::ErrorKind::Topology);
    }

    #[test]
    fn test_segmenter_features() {
        let segs = Segmenter.execute((axis(), channel()), params(50.0)).unwrap();
        assert_eq!(segs.len(), 2);
        let f = segs[0].to_feature();
        assert_eq!(f.get_property("ID_SEQ"), Some(&chanshift_core::AttributeValue::Int(2)));
        assert_eq!(f.get_property("Distance"), Some(&chanshift_core::AttributeValue::Float(50.0)));
    }
}
