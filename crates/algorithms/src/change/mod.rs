//! Channel change classification
//!
//! Compares two observations of the same channel and labels every part of
//! their combined envelope with what happened there between the two years
//! (erosion, deposition, island changes, stability) and on which bank
//! relative to each year's centerline.
//!
//! Steps:
//! 1. Envelope: hole-free union of both filled channels
//! 2. Side masks: each centerline anchored to the envelope and used to cut
//!    it into LEFT and RIGHT banks
//! 3. Membership overlay: channel / island / absent per year
//! 4. Labelling: EA class, direction and migration per overlay piece
//! 5. Dissolve by label, sorted for deterministic output

mod labels;
mod side_mask;

pub use labels::{
    classify_ea, direction, migration, period, span_year, Direction, EaClass, Membership,
};
pub use side_mask::{anchor_centerline, bank_sides, side_mask, SideMask};

use chanshift_core::{Algorithm, Error, Feature, Result, Side, Year};
use geo::{Area, Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::centerline::Centerline;
use crate::vector::{difference, dissolve, fill_holes, intersection, remove_slivers, union};

/// One year of a channel: its raw polygon (holes are islands) and centerline
#[derive(Debug, Clone)]
pub struct PeriodInput {
    pub year: Year,
    pub channel: MultiPolygon<f64>,
    pub centerline: Centerline,
}

impl PeriodInput {
    pub fn new(year: impl Into<Year>, channel: MultiPolygon<f64>, centerline: Centerline) -> Self {
        Self {
            year: year.into(),
            channel,
            centerline,
        }
    }
}

/// Parameters for change classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeParams {
    /// Overlay parts smaller than this fraction of the envelope area are
    /// dropped as slivers
    pub sliver_ratio: f64,
}

impl Default for ChangeParams {
    fn default() -> Self {
        Self { sliver_ratio: 1e-9 }
    }
}

/// Undissolved overlay piece with the memberships and sides it came from
#[derive(Debug, Clone)]
pub struct RegionPiece {
    pub geometry: MultiPolygon<f64>,
    pub old: Membership,
    pub young: Membership,
    pub old_side: Side,
    pub young_side: Side,
    pub ea: EaClass,
    pub direction: Direction,
}

/// Dissolved change region of one year pair
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRegion {
    pub geometry: MultiPolygon<f64>,
    pub ea: EaClass,
    pub direction: Direction,
    pub migration: String,
    pub period: String,
    pub span_year: i32,
}

impl ChangeRegion {
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Feature with `EA`, `direction`, `migration`, `period` and `span_year`
    pub fn to_feature(&self) -> Feature {
        Feature::new(Geometry::MultiPolygon(self.geometry.clone()))
            .with_property("EA", self.ea.as_str())
            .with_property("direction", self.direction.as_str())
            .with_property("migration", self.migration.clone())
            .with_property("period", self.period.clone())
            .with_property("span_year", i64::from(self.span_year))
    }
}

/// Change classification algorithm
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier;

impl Algorithm for ChangeClassifier {
    type Input = (PeriodInput, PeriodInput);
    type Output = Vec<ChangeRegion>;
    type Params = ChangeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ChangeClassifier"
    }

    fn description(&self) -> &'static str {
        "Classify erosion and deposition between two channel observations"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        classify_change_with(&input.0, &input.1, &params)
    }
}

/// Hole-free union of both years' filled channels.
pub fn envelope(older: &MultiPolygon<f64>, younger: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    fill_holes(&union(&fill_holes(older)?, &fill_holes(younger)?)?)
}

fn membership_layers(
    raw: &MultiPolygon<f64>,
    envelope: &MultiPolygon<f64>,
) -> Result<[(Membership, MultiPolygon<f64>); 3]> {
    let filled = fill_holes(raw)?;
    Ok([
        (Membership::Channel, raw.clone()),
        (Membership::Island, difference(&filled, raw)?),
        (Membership::Absent, difference(envelope, &filled)?),
    ])
}

/// Overlay memberships and side masks of two years into labelled pieces.
///
/// Errors carry the `"<old>_<young>"` period as context.
pub fn overlay_regions(
    older: &PeriodInput,
    younger: &PeriodInput,
    params: &ChangeParams,
) -> Result<Vec<RegionPiece>> {
    let context = period(&older.year, &younger.year);
    overlay_pieces(older, younger, params).map_err(|e| e.in_context(context))
}

fn overlay_pieces(
    older: &PeriodInput,
    younger: &PeriodInput,
    params: &ChangeParams,
) -> Result<Vec<RegionPiece>> {
    let uni = envelope(&older.channel, &younger.channel)?;
    let min_area = uni.unsigned_area() * params.sliver_ratio;

    let old_mask = bank_sides(older.centerline.single_part()?, &uni)?;
    let young_mask = bank_sides(younger.centerline.single_part()?, &uni)?;

    let mut quadrants = Vec::with_capacity(4);
    for old_side in [Side::Left, Side::Right] {
        for young_side in [Side::Left, Side::Right] {
            let q = intersection(old_mask.side(old_side), young_mask.side(young_side))?;
            let q = remove_slivers(q, min_area);
            if !q.0.is_empty() {
                quadrants.push((old_side, young_side, q));
            }
        }
    }

    let old_layers = membership_layers(&older.channel, &uni)?;
    let young_layers = membership_layers(&younger.channel, &uni)?;

    let mut pieces = Vec::new();
    for (old, old_geom) in &old_layers {
        for (young, young_geom) in &young_layers {
            let base = remove_slivers(intersection(old_geom, young_geom)?, min_area);
            if base.0.is_empty() {
                continue;
            }
            let ea = classify_ea(*old, *young);
            for (old_side, young_side, quadrant) in &quadrants {
                let geometry = remove_slivers(intersection(&base, quadrant)?, min_area);
                if geometry.0.is_empty() {
                    continue;
                }
                pieces.push(RegionPiece {
                    geometry,
                    old: *old,
                    young: *young,
                    old_side: *old_side,
                    young_side: *young_side,
                    ea,
                    direction: direction(ea, *old_side, *young_side),
                });
            }
        }
    }

    debug!(
        quadrants = quadrants.len(),
        pieces = pieces.len(),
        "membership overlay"
    );
    Ok(pieces)
}

/// Classify the change between two observations with default parameters.
pub fn classify_change(older: &PeriodInput, younger: &PeriodInput) -> Result<Vec<ChangeRegion>> {
    classify_change_with(older, younger, &ChangeParams::default())
}

/// Classify the change between two observations.
///
/// Regions are dissolved by label and returned sorted by EA class, then
/// direction.
///
/// # Errors
/// * `InvalidParameter` when a year token has no numeric prefix
/// * `Topology` when a centerline is not a single part or misses the
///   envelope
/// * `GeometryOperation` when an overlay fails
pub fn classify_change_with(
    older: &PeriodInput,
    younger: &PeriodInput,
    params: &ChangeParams,
) -> Result<Vec<ChangeRegion>> {
    let span = span_year(&older.year, &younger.year)?;
    let label = period(&older.year, &younger.year);

    let pieces = overlay_regions(older, younger, params)?;
    let min_area = pieces
        .iter()
        .map(|p| p.geometry.unsigned_area())
        .sum::<f64>()
        * params.sliver_ratio;

    let groups = dissolve(pieces.into_iter().map(|p| ((p.ea, p.direction), p.geometry)))
        .map_err(|e| e.in_context(label.clone()))?;

    let regions: Vec<ChangeRegion> = groups
        .into_iter()
        .map(|((ea, dir), geometry)| ChangeRegion {
            geometry: remove_slivers(geometry, min_area),
            ea,
            direction: dir,
            migration: migration(ea, dir),
            period: label.clone(),
            span_year: span,
        })
        .filter(|r| !r.geometry.0.is_empty())
        .collect();

    debug!(period = %label, regions = regions.len(), "change classified");
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chanshift_core::ErrorKind;
    use geo::{LineString, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    fn axis(y: f64) -> Centerline {
        Centerline::from_line(LineString::from(vec![(0.0, y), (100.0, y)]))
    }

    fn shifted_pair() -> (PeriodInput, PeriodInput) {
        (
            PeriodInput::new("2000", MultiPolygon::new(vec![rect(0.0, 0.0, 100.0, 25.0)]), axis(12.5)),
            PeriodInput::new("2010", MultiPolygon::new(vec![rect(0.0, 5.0, 100.0, 30.0)]), axis(17.5)),
        )
    }

    #[test]
    fn test_northward_shift() {
        let (older, younger) = shifted_pair();
        let regions = classify_change(&older, &younger).unwrap();
        assert_eq!(regions.len(), 3);

        assert_eq!(regions[0].ea, EaClass::Erosion);
        assert_eq!(regions[0].migration, "erosion_LEFT");
        assert_relative_eq!(regions[0].area(), 500.0, epsilon = 1e-6);

        assert_eq!(regions[1].ea, EaClass::Deposition);
        assert_eq!(regions[1].migration, "deposition_RIGHT");
        assert_relative_eq!(regions[1].area(), 500.0, epsilon = 1e-6);

        assert_eq!(regions[2].ea, EaClass::Stable);
        assert_eq!(regions[2].direction, Direction::InChannel);
        assert_relative_eq!(regions[2].area(), 2000.0, epsilon = 1e-6);

        for r in &regions {
            assert_eq!(r.period, "2000_2010");
            assert_eq!(r.span_year, 10);
        }
    }

    #[test]
    fn test_filled_island_is_island_erosion() {
        let hole = LineString::from(vec![
            (40.0, 10.0), (60.0, 10.0), (60.0, 15.0), (40.0, 15.0), (40.0, 10.0),
        ]);
        let with_island = Polygon::new(rect(0.0, 0.0, 100.0, 25.0).exterior().clone(), vec![hole]);
        let older = PeriodInput::new("1990", MultiPolygon::new(vec![with_island]), axis(12.5));
        let younger = PeriodInput::new("1995", MultiPolygon::new(vec![rect(0.0, 0.0, 100.0, 25.0)]), axis(12.5));

        let regions = classify_change(&older, &younger).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].ea, EaClass::IslandErosion);
        assert_eq!(regions[0].migration, "in-channel process");
        assert_relative_eq!(regions[0].area(), 100.0, epsilon = 1e-6);
        assert_eq!(regions[1].ea, EaClass::Stable);
        assert_relative_eq!(regions[1].area(), 2400.0, epsilon = 1e-6);
    }

    /// Channel bent around a 80 x 20 gap, opening to the east or the west
    fn c_shape(open_east: bool) -> MultiPolygon<f64> {
        let ring = if open_east {
            vec![
                (0.0, 0.0), (100.0, 0.0), (100.0, 10.0), (10.0, 10.0), (10.0, 30.0),
                (100.0, 30.0), (100.0, 40.0), (0.0, 40.0), (0.0, 0.0),
            ]
        } else {
            vec![
                (0.0, 0.0), (100.0, 0.0), (100.0, 40.0), (0.0, 40.0), (0.0, 30.0),
                (90.0, 30.0), (90.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]
        };
        MultiPolygon::new(vec![Polygon::new(LineString::from(ring), vec![])])
    }

    #[test]
    fn test_gap_closed_by_both_years_is_hollow() {
        // Neither channel encloses the gap on its own, their union does
        let older = PeriodInput::new("2000", c_shape(true), axis(35.0));
        let younger = PeriodInput::new("2010", c_shape(false), axis(5.0));
        let regions = classify_change(&older, &younger).unwrap();

        let find = |ea: EaClass| regions.iter().find(|r| r.ea == ea).unwrap();

        let hollow = find(EaClass::Hollow);
        assert_eq!(hollow.direction, Direction::Bank(Side::Left));
        assert_eq!(hollow.migration, "erosion_LEFT");
        assert_relative_eq!(hollow.area(), 1600.0, epsilon = 1e-6);

        let erosion = find(EaClass::Erosion);
        assert_eq!(erosion.migration, "erosion_RIGHT");
        assert_relative_eq!(erosion.area(), 200.0, epsilon = 1e-6);

        let deposition = find(EaClass::Deposition);
        assert_eq!(deposition.migration, "deposition_LEFT");
        assert_relative_eq!(deposition.area(), 200.0, epsilon = 1e-6);

        assert_relative_eq!(find(EaClass::Stable).area(), 2000.0, epsilon = 1e-6);
        assert_eq!(regions.iter().filter(|r| r.ea == EaClass::Hollow).count(), 1);
    }

    #[test]
    fn test_overlay_pieces_keep_memberships() {
        let (older, younger) = shifted_pair();
        let pieces = overlay_regions(&older, &younger, &ChangeParams::default()).unwrap();
        let erosion: Vec<_> = pieces.iter().filter(|p| p.ea == EaClass::Erosion).collect();
        assert!(!erosion.is_empty());
        assert!(erosion
            .iter()
            .all(|p| p.old == Membership::Absent && p.young == Membership::Channel));
    }

    #[test]
    fn test_unparsable_year_is_configuration_error() {
        let (mut older, younger) = shifted_pair();
        older.year = Year::new("early");
        let err = classify_change(&older, &younger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_branched_centerline_names_the_period() {
        let (older, mut younger) = shifted_pair();
        younger.centerline = Centerline::from_parts(vec![
            LineString::from(vec![(0.0, 17.5), (50.0, 17.5)]),
            LineString::from(vec![(50.0, 17.5), (100.0, 20.0)]),
        ]);
        let err = classify_change(&older, &younger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Topology);
        assert!(err.to_string().contains("2000_2010"));
    }

    #[test]
    fn test_region_feature_attributes() {
        let (older, younger) = shifted_pair();
        let regions = ChangeClassifier.execute_default((older, younger)).unwrap();
        let f = regions[0].to_feature();
        assert_eq!(f.get_property("EA").map(|v| v.to_string()), Some("erosion".to_string()));
        assert_eq!(f.get_property("direction").map(|v| v.to_string()), Some("LEFT".to_string()));
        assert_eq!(f.get_property("span_year").map(|v| v.to_string()), Some("10".to_string()));
    }
}
