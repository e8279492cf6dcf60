//! Migration rates and change regions per channel segment

use std::collections::BTreeMap;

use chanshift_core::{Error, Feature, Result};
use geo::{Area, Geometry, MultiPolygon, Polygon};

use crate::change::{ChangeRegion, Direction, EaClass};
use crate::maybe_rayon::*;
use crate::segmentation::Segment;
use crate::vector::{dissolve, intersection};

/// Migrated area of one period inside one segment cell
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRate {
    pub geometry: MultiPolygon<f64>,
    pub segment_id: usize,
    pub distance: f64,
    pub period: String,
    pub span_year: i32,
    pub migration: String,
    /// Area per year; positive for erosion, negative for deposition
    pub rate_area: f64,
    /// `rate_area` per unit of segment length
    pub rate_lateral: f64,
}

impl MigrationRate {
    pub fn to_feature(&self) -> Feature {
        Feature::new(Geometry::MultiPolygon(self.geometry.clone()))
            .with_property("ID_SEQ", self.segment_id as i64)
            .with_property("Distance", self.distance)
            .with_property("period", self.period.clone())
            .with_property("span_year", i64::from(self.span_year))
            .with_property("migration", self.migration.clone())
            .with_property("EA_rate_A", self.rate_area)
            .with_property("EA_rate_m", self.rate_lateral)
    }
}

/// Signed yearly area for a migration label.
///
/// Erosion counts up, deposition down, in-channel processes not at all.
pub fn signed_rate(migration: &str, area: f64, span_year: i32) -> f64 {
    let per_year = area / f64::from(span_year.max(1));
    if migration.starts_with("erosion_") {
        per_year
    } else if migration.starts_with("deposition_") {
        -per_year
    } else {
        0.0
    }
}

/// Migration rate of every (period, migration) group in every segment.
///
/// Regions are first dissolved by `(span_year, migration, period)`. Output
/// follows segment order, then group order.
pub fn migration_rates(regions: &[ChangeRegion], segments: &[Segment]) -> Result<Vec<MigrationRate>> {
    let groups: BTreeMap<(i32, String, String), MultiPolygon<f64>> = dissolve(
        regions
            .iter()
            .map(|r| ((r.span_year, r.migration.clone(), r.period.clone()), r.geometry.clone())),
    )?;

    let per_segment: Vec<Vec<MigrationRate>> = segments
        .into_par_iter()
        .map(|segment| {
            let mut rates = Vec::new();
            for ((span_year, migration, period), geometry) in &groups {
                let piece = intersection(geometry, &segment.cell)?;
                if piece.0.is_empty() {
                    continue;
                }
                let rate_area = signed_rate(migration, piece.unsigned_area(), *span_year);
                rates.push(MigrationRate {
                    geometry: piece,
                    segment_id: segment.id,
                    distance: segment.distance,
                    period: period.clone(),
                    span_year: *span_year,
                    migration: migration.clone(),
                    rate_area,
                    rate_lateral: rate_area / segment.distance,
                });
            }
            Ok::<_, Error>(rates)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(per_segment.into_iter().flatten().collect())
}

/// Single-part change region clipped to one segment cell
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentChange {
    pub geometry: Polygon<f64>,
    pub ea: EaClass,
    pub direction: Direction,
    pub migration: String,
    pub period: String,
    pub span_year: i32,
    pub segment_id: usize,
    pub distance: f64,
}

impl SegmentChange {
    pub fn to_feature(&self) -> Feature {
        Feature::new(Geometry::Polygon(self.geometry.clone()))
            .with_property("EA", self.ea.as_str())
            .with_property("direction", self.direction.as_str())
            .with_property("migration", self.migration.clone())
            .with_property("period", self.period.clone())
            .with_property("span_year", i64::from(self.span_year))
            .with_property("ID_SEQ", self.segment_id as i64)
            .with_property("Distance", self.distance)
    }
}

/// Change regions intersected with segment cells, exploded to single parts.
pub fn change_per_segment(regions: &[ChangeRegion], segments: &[Segment]) -> Result<Vec<SegmentChange>> {
    let per_segment: Vec<Vec<SegmentChange>> = segments
        .into_par_iter()
        .map(|segment| {
            let mut out = Vec::new();
            for region in regions {
                let piece = intersection(&region.geometry, &segment.cell)?;
                out.extend(piece.0.into_iter().map(|geometry| SegmentChange {
                    geometry,
                    ea: region.ea,
                    direction: region.direction,
                    migration: region.migration.clone(),
                    period: region.period.clone(),
                    span_year: region.span_year,
                    segment_id: segment.id,
                    distance: segment.distance,
                }));
            }
            Ok::<_, Error>(out)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(per_segment.into_iter().flatten().collect())
}
