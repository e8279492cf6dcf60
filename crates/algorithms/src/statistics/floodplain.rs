//! Floodplain age map and per-segment floodplain statistics
//!
//! The floodplain age map (FAM) assigns every location covered by any
//! observed channel the most recent year a channel covered it. FAM regions
//! are cut by segment cells and can be enriched with zonal summaries of
//! external rasters, typically height above channel (HACH) and canopy
//! height, supplied through [`ZonalSource`].

use std::collections::BTreeMap;

use chanshift_core::{Error, Feature, Result};
use geo::{Geometry, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::maybe_rayon::*;
use crate::segmentation::Segment;
use crate::vector::{difference, intersection, union};

/// Summary of raster values inside one region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonalSummary {
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub mean: f64,
    pub std: f64,
    pub sum: f64,
}

impl ZonalSummary {
    /// Summarize the finite values; `None` when there are none.
    ///
    /// `std` is the population standard deviation.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let vals: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }
        let count = vals.len() as f64;
        let sum: f64 = vals.iter().sum();
        let mean = sum / count;
        let var = vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            min,
            max,
            range: max - min,
            mean,
            std: var.sqrt(),
            sum,
        })
    }

    fn write_into(&self, feature: &mut Feature, prefix: &str) {
        for (name, value) in [
            ("MIN", self.min),
            ("MAX", self.max),
            ("RANGE", self.range),
            ("MEAN", self.mean),
            ("STD", self.std),
            ("SUM", self.sum),
        ] {
            feature.set_property(format!("{prefix}{name}"), value.into());
        }
    }
}

/// External raster summarized over polygons.
///
/// Implementations read whatever raster they wrap; `Ok(None)` means the
/// region holds no data cells.
pub trait ZonalSource: Sync {
    fn summarize(&self, region: &Polygon<f64>) -> Result<Option<ZonalSummary>>;
}

/// Floodplain age map: year -> region whose most recent channel is that year.
///
/// `channels` may come in any order; later years win where channels overlap.
pub fn floodplain_age(channels: &[(i32, MultiPolygon<f64>)]) -> Result<BTreeMap<i32, MultiPolygon<f64>>> {
    let mut ordered: Vec<&(i32, MultiPolygon<f64>)> = channels.iter().collect();
    ordered.sort_by_key(|(year, _)| *year);

    let mut fam: BTreeMap<i32, MultiPolygon<f64>> = BTreeMap::new();
    for (year, channel) in ordered {
        for region in fam.values_mut() {
            *region = difference(region, channel)?;
        }
        let merged = match fam.remove(year) {
            Some(existing) => union(&existing, channel)?,
            None => channel.clone(),
        };
        fam.insert(*year, merged);
    }
    fam.retain(|_, region| !region.0.is_empty());
    debug!(ages = fam.len(), "floodplain age map built");
    Ok(fam)
}

/// One single-part floodplain piece inside one segment cell
#[derive(Debug, Clone, PartialEq)]
pub struct FloodplainPiece {
    pub geometry: Polygon<f64>,
    pub fam: i32,
    pub segment_id: usize,
    pub distance: f64,
    /// Height above channel summary (`e_*` attributes)
    pub hach: Option<ZonalSummary>,
    /// Canopy height summary (`v_*` attributes)
    pub canopy: Option<ZonalSummary>,
}

impl FloodplainPiece {
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature::new(Geometry::Polygon(self.geometry.clone()))
            .with_property("FAM", i64::from(self.fam))
            .with_property("ID_SEQ", self.segment_id as i64)
            .with_property("Distance", self.distance);
        if let Some(s) = &self.hach {
            s.write_into(&mut feature, "e_");
        }
        if let Some(s) = &self.canopy {
            s.write_into(&mut feature, "v_");
        }
        feature
    }
}

/// Cut the age map by segment cells and attach the optional zonal summaries.
pub fn floodplain_statistics(
    fam: &BTreeMap<i32, MultiPolygon<f64>>,
    segments: &[Segment],
    hach: Option<&dyn ZonalSource>,
    canopy: Option<&dyn ZonalSource>,
) -> Result<Vec<FloodplainPiece>> {
    let summarize = |source: Option<&dyn ZonalSource>, region: &Polygon<f64>| match source {
        Some(src) => src.summarize(region),
        None => Ok(None),
    };

    let per_segment: Vec<Vec<FloodplainPiece>> = segments
        .into_par_iter()
        .map(|segment| {
            let mut out = Vec::new();
            for (year, region) in fam {
                let piece = intersection(region, &segment.cell)?;
                for geometry in piece.0 {
                    out.push(FloodplainPiece {
                        hach: summarize(hach, &geometry)?,
                        canopy: summarize(canopy, &geometry)?,
                        geometry,
                        fam: *year,
                        segment_id: segment.id,
                        distance: segment.distance,
                    });
                }
            }
            Ok::<_, Error>(out)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(per_segment.into_iter().flatten().collect())
}
