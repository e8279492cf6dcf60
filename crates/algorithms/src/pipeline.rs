//! Multi-year channel shifting run
//!
//! Ties the stages together for a series of channel observations:
//! per-year centerlines, a composite centerline over all years, its
//! segmentation, change classification of every consecutive year pair,
//! per-segment statistics and the floodplain age map.
//!
//! Processing layers (filled channels, the composite channel, pair
//! envelopes) live in a scratch set that is dropped when the run ends,
//! whichever way it ends, unless `keep_intermediates` asks to return them.

use std::collections::BTreeMap;

use chanshift_core::{
    AttributeValue, Error, Feature, FeatureCollection, FieldMatch, Result, Year, CRS,
};
use geo::{Distance, Euclidean, Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::centerline::{extract_centerline, Centerline, CenterlineParams};
use crate::change::{classify_change_with, envelope, period, ChangeParams, ChangeRegion, PeriodInput};
use crate::maybe_rayon::*;
use crate::segmentation::{segment_centerline, Segment, SegmentParams};
use crate::statistics::{
    change_per_segment, floodplain_age, floodplain_statistics, migration_rates, FloodplainPiece,
    SegmentStatistics, ZonalSource,
};
use crate::vector::{fill_holes, union_all};

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Year attribute of channel layers (exact name)
    pub year_field: String,
    /// Year attribute of centerline layers (first field containing the name)
    pub centerline_year_field: String,
    pub centerline: CenterlineParams,
    pub segmentation: SegmentParams,
    pub change: ChangeParams,
    /// Return processing layers with the run instead of releasing them
    pub keep_intermediates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year_field: "year".to_string(),
            centerline_year_field: "year".to_string(),
            centerline: CenterlineParams::default(),
            segmentation: SegmentParams::default(),
            change: ChangeParams::default(),
            keep_intermediates: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.year_field.is_empty() {
            return Err(Error::invalid_parameter("year_field", "", "must name an attribute"));
        }
        if self.centerline_year_field.is_empty() {
            return Err(Error::invalid_parameter(
                "centerline_year_field",
                "",
                "must name an attribute",
            ));
        }
        if let Some(tol) = self.centerline.snap_tolerance {
            if !(tol > 0.0) || !tol.is_finite() {
                return Err(Error::invalid_parameter("snap_tolerance", tol, "must be positive"));
            }
        }
        if !(self.change.sliver_ratio >= 0.0) {
            return Err(Error::invalid_parameter(
                "sliver_ratio",
                self.change.sliver_ratio,
                "must not be negative",
            ));
        }
        self.segmentation.validate()
    }
}

/// Channel polygon of one observation year
#[derive(Debug, Clone)]
pub struct ChannelObservation {
    pub year: Year,
    pub channel: MultiPolygon<f64>,
}

impl ChannelObservation {
    pub fn new(year: impl Into<Year>, channel: MultiPolygon<f64>) -> Self {
        Self {
            year: year.into(),
            channel,
        }
    }

    /// Read a single-year channel layer. The year attribute must match
    /// `year_field` exactly; all polygon features are merged.
    pub fn from_layer(layer: &FeatureCollection, year_field: &str) -> Result<Self> {
        let year = layer.year(year_field, FieldMatch::Exact)?;
        let mut parts: Vec<MultiPolygon<f64>> = layer
            .iter()
            .filter_map(|f| match &f.geometry {
                Some(Geometry::Polygon(p)) => Some(MultiPolygon::new(vec![p.clone()])),
                Some(Geometry::MultiPolygon(mp)) => Some(mp.clone()),
                _ => None,
            })
            .collect();
        let channel = match parts.len() {
            0 => return Err(Error::topology(year.as_str(), "channel layer holds no polygon")),
            1 => parts.remove(0),
            _ => union_all(&parts).map_err(|e| e.in_context(year.as_str()))?,
        };
        Ok(Self { year, channel })
    }
}

/// Centerline of one observation year
#[derive(Debug, Clone)]
pub struct CenterlineObservation {
    pub year: Year,
    pub centerline: Centerline,
}

impl CenterlineObservation {
    pub fn new(year: impl Into<Year>, centerline: Centerline) -> Self {
        Self {
            year: year.into(),
            centerline,
        }
    }

    /// Read a single-year centerline layer. The year attribute is the first
    /// field whose name contains `year_field`; every line becomes a part.
    pub fn from_layer(layer: &FeatureCollection, year_field: &str) -> Result<Self> {
        let year = layer.year(year_field, FieldMatch::Contains)?;
        let parts: Vec<_> = layer
            .iter()
            .flat_map(|f| match &f.geometry {
                Some(Geometry::LineString(l)) => vec![l.clone()],
                Some(Geometry::MultiLineString(ml)) => ml.0.clone(),
                _ => Vec::new(),
            })
            .collect();
        if parts.is_empty() {
            return Err(Error::topology(year.as_str(), "centerline layer holds no line"));
        }
        Ok(Self {
            year,
            centerline: Centerline::from_parts(parts),
        })
    }

    /// Line feature with `LENGTH` and the year under `year_field`
    pub fn to_feature(&self, year_field: &str) -> Feature {
        centerline_feature(&self.centerline).with_property(year_field, year_value(&self.year))
    }
}

fn centerline_feature(centerline: &Centerline) -> Feature {
    Feature::new(Geometry::MultiLineString(centerline.to_multi_line_string()))
        .with_property("LENGTH", centerline.length())
}

fn year_value(year: &Year) -> AttributeValue {
    match year.as_str().parse::<i64>() {
        Ok(v) => AttributeValue::Int(v),
        Err(_) => AttributeValue::String(year.to_string()),
    }
}

/// Change regions of one consecutive year pair
#[derive(Debug, Clone)]
pub struct ChangeLayer {
    pub older: Year,
    pub younger: Year,
    pub regions: Vec<ChangeRegion>,
}

impl ChangeLayer {
    pub fn period(&self) -> String {
        period(&self.older, &self.younger)
    }

    pub fn to_features(&self) -> FeatureCollection {
        self.regions.iter().map(ChangeRegion::to_feature).collect()
    }
}

/// Processing layers a run can hand back
#[derive(Debug, Clone, Default)]
pub struct Intermediates {
    /// Hole-free channel per year
    pub filled: BTreeMap<Year, MultiPolygon<f64>>,
    /// Hole-free union of all years
    pub composite_channel: Option<MultiPolygon<f64>>,
    /// Hole-free union of each consecutive pair, by period
    pub envelopes: BTreeMap<String, MultiPolygon<f64>>,
}

/// Processing layers of a run in progress; released when dropped
#[derive(Default)]
struct Scratch {
    layers: Intermediates,
}

impl Scratch {
    fn into_intermediates(mut self) -> Intermediates {
        std::mem::take(&mut self.layers)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let held = self.layers.filled.len()
            + self.layers.envelopes.len()
            + usize::from(self.layers.composite_channel.is_some());
        if held > 0 {
            debug!(layers = held, "releasing processing layers");
        }
    }
}

/// Everything a run needs besides its configuration
pub struct PipelineInput<'a> {
    pub crs: CRS,
    pub channels: Vec<ChannelObservation>,
    /// Per-year centerlines; extracted from the channels when absent
    pub centerlines: Option<Vec<CenterlineObservation>>,
    /// Line to segment; the composite centerline when absent
    pub segmentation_centerline: Option<Centerline>,
    /// Height-above-channel raster
    pub hach: Option<&'a dyn ZonalSource>,
    /// Canopy height raster
    pub canopy: Option<&'a dyn ZonalSource>,
}

impl<'a> PipelineInput<'a> {
    pub fn new(crs: CRS, channels: Vec<ChannelObservation>) -> Self {
        Self {
            crs,
            channels,
            centerlines: None,
            segmentation_centerline: None,
            hach: None,
            canopy: None,
        }
    }

    /// Channel observations read from one layer per year.
    pub fn from_layers(crs: CRS, layers: &[FeatureCollection], config: &PipelineConfig) -> Result<Self> {
        let channels = layers
            .iter()
            .map(|layer| ChannelObservation::from_layer(layer, &config.year_field))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(crs, channels))
    }

    pub fn with_centerline_layers(mut self, layers: &[FeatureCollection], config: &PipelineConfig) -> Result<Self> {
        let centerlines = layers
            .iter()
            .map(|layer| CenterlineObservation::from_layer(layer, &config.centerline_year_field))
            .collect::<Result<Vec<_>>>()?;
        self.centerlines = Some(centerlines);
        Ok(self)
    }

    pub fn with_segmentation_centerline(mut self, centerline: Centerline) -> Self {
        self.segmentation_centerline = Some(centerline);
        self
    }

    pub fn with_zonal_sources(
        mut self,
        hach: Option<&'a dyn ZonalSource>,
        canopy: Option<&'a dyn ZonalSource>,
    ) -> Self {
        self.hach = hach;
        self.canopy = canopy;
        self
    }
}

/// A year or year pair that failed while the rest of the run went on
#[derive(Debug, Clone)]
pub struct UnitFailure {
    /// Year token or `"<old>_<young>"` period
    pub unit: String,
    pub error: Error,
}

/// Outputs of the units of work that succeeded and the failures of the others
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub failures: Vec<UnitFailure>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Batch<T> {
    fn from_results(results: Vec<(String, Result<T>)>) -> Self {
        let mut batch = Self::default();
        for (unit, result) in results {
            match result {
                Ok(item) => batch.items.push(item),
                Err(error) => {
                    warn!(unit = %unit, error = %error, "skipping failed unit of work");
                    batch.failures.push(UnitFailure { unit, error });
                }
            }
        }
        batch
    }
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub crs: CRS,
    /// Per-year centerlines in year order
    pub centerlines: Vec<CenterlineObservation>,
    /// Centerline the segments were cut from
    pub composite: Centerline,
    pub segments: Vec<Segment>,
    /// One layer per consecutive year pair that could be classified
    pub changes: Vec<ChangeLayer>,
    /// Per-segment statistics keyed by period
    pub statistics: BTreeMap<String, SegmentStatistics>,
    /// Floodplain age map keyed by year
    pub floodplain_age: BTreeMap<i32, MultiPolygon<f64>>,
    pub floodplain: Vec<FloodplainPiece>,
    /// Years and pairs left out of the outputs above
    pub failures: Vec<UnitFailure>,
    pub intermediates: Option<Intermediates>,
}

impl PipelineRun {
    /// Every output as a named feature layer, in the run's spatial reference.
    pub fn layers(&self, year_field: &str) -> Vec<(String, FeatureCollection)> {
        let mut layers = Vec::new();
        for obs in &self.centerlines {
            layers.push((
                format!("centerline_{}", obs.year),
                std::iter::once(obs.to_feature(year_field)).collect(),
            ));
        }
        layers.push((
            "SegCenterline".to_string(),
            std::iter::once(centerline_feature(&self.composite)).collect(),
        ));
        layers.push((
            "segments".to_string(),
            self.segments.iter().map(Segment::to_feature).collect(),
        ));
        for layer in &self.changes {
            let label = layer.period();
            layers.push((format!("EA_{label}"), layer.to_features()));
            let Some(stats) = self.statistics.get(&label) else {
                continue;
            };
            layers.push((
                format!("EAsegments_{label}"),
                stats.changes.iter().map(|c| c.to_feature()).collect(),
            ));
            layers.push((
                format!("EA_rate_{label}"),
                stats.rates.iter().map(|r| r.to_feature()).collect(),
            ));
        }
        layers.push((
            "fam_layer".to_string(),
            self.floodplain_age
                .iter()
                .flat_map(|(year, region)| {
                    region.0.iter().map(move |p| {
                        Feature::new(Geometry::Polygon(p.clone())).with_property("FAM", i64::from(*year))
                    })
                })
                .collect(),
        ));
        layers.push((
            "floodplain_statistics".to_string(),
            self.floodplain.iter().map(FloodplainPiece::to_feature).collect(),
        ));
        layers
    }
}

fn sorted_by_year<T, F>(items: &[T], year: F) -> Vec<&T>
where
    F: Fn(&T) -> &Year,
{
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| year(a).cmp(year(b)));
    sorted
}

fn centerline_of(obs: &ChannelObservation, params: &CenterlineParams) -> Result<CenterlineObservation> {
    let centerline = extract_centerline(&obs.channel, params).map_err(|e| e.in_context(obs.year.as_str()))?;
    if centerline.part_count() > 1 {
        warn!(
            year = %obs.year,
            parts = centerline.part_count(),
            "centerline has several parts, check its topology"
        );
    }
    Ok(CenterlineObservation {
        year: obs.year.clone(),
        centerline,
    })
}

/// Extract the centerline of every channel, returned in year order.
///
/// Multi-part results are kept and reported with a warning. A year whose
/// extraction fails is reported in `failures` and the others go on.
pub fn individual_centerlines(
    channels: &[ChannelObservation],
    params: &CenterlineParams,
) -> Batch<CenterlineObservation> {
    let results = sorted_by_year(channels, |c| &c.year)
        .into_par_iter()
        .map(|obs| (obs.year.to_string(), centerline_of(obs, params)))
        .collect::<Vec<_>>();
    Batch::from_results(results)
}

/// Hole-free union of already filled channels.
pub fn composite_channel<'a, I>(filled: I) -> Result<MultiPolygon<f64>>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    fill_holes(&union_all(filled)?)
}

/// Centerline of the composite channel, the line segments are cut from.
pub fn composite_centerline(composite: &MultiPolygon<f64>, params: &CenterlineParams) -> Result<Centerline> {
    extract_centerline(composite, params).map_err(|e| e.in_context("composite"))
}

/// One year of a series as seen by pair classification
struct PairSlot<'a> {
    year: &'a Year,
    channel: &'a MultiPolygon<f64>,
    centerline: Option<&'a Centerline>,
}

/// `younger` traced in the direction of `older`, so both years agree on
/// which bank is LEFT. Branched centerlines come back unchanged.
fn aligned_with(younger: &Centerline, older: &Centerline) -> Centerline {
    let (Ok(young), Ok(old)) = (younger.single_part(), older.single_part()) else {
        return younger.clone();
    };
    let (Some(&ys), Some(&ye), Some(&os), Some(&oe)) = (young.0.first(), young.0.last(), old.0.first(), old.0.last())
    else {
        return younger.clone();
    };
    let along = Euclidean::distance(ys, os) + Euclidean::distance(ye, oe);
    let against = Euclidean::distance(ys, oe) + Euclidean::distance(ye, os);
    if against < along {
        debug!("younger centerline runs against the older one, reversing it");
        younger.reversed()
    } else {
        younger.clone()
    }
}

fn classify_pair(older: &PairSlot<'_>, younger: &PairSlot<'_>, params: &ChangeParams) -> Result<ChangeLayer> {
    let label = period(older.year, younger.year);
    info!(period = %label, "classifying channel change");
    let missing = |slot: &PairSlot<'_>| Error::topology(label.clone(), format!("no centerline for {}", slot.year));
    let old_line = older.centerline.ok_or_else(|| missing(older))?;
    let young_line = younger.centerline.ok_or_else(|| missing(younger))?;

    let old_input = PeriodInput::new(older.year.clone(), older.channel.clone(), old_line.clone());
    let young_input = PeriodInput::new(
        younger.year.clone(),
        younger.channel.clone(),
        aligned_with(young_line, old_line),
    );
    Ok(ChangeLayer {
        older: older.year.clone(),
        younger: younger.year.clone(),
        regions: classify_change_with(&old_input, &young_input, params)?,
    })
}

fn classify_slots(slots: &[PairSlot<'_>], params: &ChangeParams) -> Batch<ChangeLayer> {
    let pairs: Vec<&[PairSlot<'_>]> = slots.windows(2).collect();
    let results = pairs
        .into_par_iter()
        .map(|pair| {
            let (older, younger) = (&pair[0], &pair[1]);
            (period(older.year, younger.year), classify_pair(older, younger, params))
        })
        .collect::<Vec<_>>();
    Batch::from_results(results)
}

/// Classify every consecutive pair of observations.
///
/// Channels and centerlines are paired in year order. A differing year set
/// is only reported; a differing count is an error. The younger centerline
/// of each pair is traced in the direction of the older one. A pair that
/// fails is reported in `failures` and the other pairs go on.
pub fn classify_series(
    channels: &[ChannelObservation],
    centerlines: &[CenterlineObservation],
    params: &ChangeParams,
) -> Result<Batch<ChangeLayer>> {
    let channels = sorted_by_year(channels, |c| &c.year);
    let centerlines = sorted_by_year(centerlines, |c| &c.year);

    let channel_years: Vec<&Year> = channels.iter().map(|c| &c.year).collect();
    let centerline_years: Vec<&Year> = centerlines.iter().map(|c| &c.year).collect();
    if channel_years == centerline_years {
        debug!(years = channel_years.len(), "channel and centerline years match");
    } else {
        warn!("channel polygon years do not match centerline years");
    }
    if channels.len() != centerlines.len() {
        return Err(Error::ObservationCountMismatch {
            channels: channels.len(),
            centerlines: centerlines.len(),
        });
    }

    let slots: Vec<PairSlot<'_>> = channels
        .iter()
        .zip(&centerlines)
        .map(|(ch, cl)| PairSlot {
            year: &ch.year,
            channel: &ch.channel,
            centerline: Some(&cl.centerline),
        })
        .collect();
    Ok(classify_slots(&slots, params))
}

fn segment_statistics(layer: &ChangeLayer, segments: &[Segment]) -> Result<SegmentStatistics> {
    Ok(SegmentStatistics {
        rates: migration_rates(&layer.regions, segments)?,
        changes: change_per_segment(&layer.regions, segments)?,
    })
}

/// Floodplain age map and its per-segment pieces.
pub fn floodplain(
    channels: &[ChannelObservation],
    segments: &[Segment],
    hach: Option<&dyn ZonalSource>,
    canopy: Option<&dyn ZonalSource>,
) -> Result<(BTreeMap<i32, MultiPolygon<f64>>, Vec<FloodplainPiece>)> {
    let dated = channels
        .iter()
        .map(|c| {
            c.year
                .numeric()
                .map(|y| (y, c.channel.clone()))
                .ok_or_else(|| Error::invalid_parameter("year", &c.year, "first four characters are not a year"))
        })
        .collect::<Result<Vec<_>>>()?;
    let fam = floodplain_age(&dated)?;
    let pieces = floodplain_statistics(&fam, segments, hach, canopy)?;
    Ok((fam, pieces))
}

/// Run the whole analysis.
///
/// Per-year centerline extraction, pair classification and pair statistics
/// fail one unit at a time: the unit is left out, reported in
/// [`PipelineRun::failures`] and the run goes on.
///
/// # Errors
/// * Configuration errors for invalid parameters, no input channels or
///   mismatched observation counts
/// * Topology and geometry errors of the stages every output depends on
///   (hole filling, the composite channel and its centerline, segmentation,
///   the floodplain age map), with its year or `composite` as context
pub fn run(config: &PipelineConfig, input: PipelineInput<'_>) -> Result<PipelineRun> {
    config.validate()?;
    if input.channels.is_empty() {
        return Err(Error::invalid_parameter("channels", 0, "at least one channel layer is required"));
    }

    let mut scratch = Scratch::default();
    let mut failures = Vec::new();
    let mut channels = input.channels;
    channels.sort_by(|a, b| a.year.cmp(&b.year));

    info!(years = channels.len(), "STEP 1 preprocessing channel polygons");
    for c in &channels {
        let filled = fill_holes(&c.channel).map_err(|e| e.in_context(c.year.as_str()))?;
        scratch.layers.filled.insert(c.year.clone(), filled);
    }

    info!("STEP 2 centerline of every channel");
    let centerlines_supplied = input.centerlines.is_some();
    let centerlines = match input.centerlines {
        Some(mut supplied) => {
            supplied.sort_by(|a, b| a.year.cmp(&b.year));
            supplied
        }
        None => {
            let batch = individual_centerlines(&channels, &config.centerline);
            failures.extend(batch.failures);
            batch.items
        }
    };

    info!("STEP 3 composite channel and its centerline");
    let channel_union = composite_channel(scratch.layers.filled.values())?;
    let composite = match input.segmentation_centerline {
        Some(line) => line,
        None => composite_centerline(&channel_union, &config.centerline)?,
    };

    info!(interval = config.segmentation.interval, "STEP 4 segmentation");
    let segments = segment_centerline(&composite, &channel_union, &config.segmentation)
        .map_err(|e| e.in_context("composite"))?;
    scratch.layers.composite_channel = Some(channel_union);

    info!("STEP 5 erosion and deposition between consecutive years");
    let changes = if channels.len() < 2 {
        Batch::default()
    } else if centerlines_supplied {
        classify_series(&channels, &centerlines, &config.change)?
    } else {
        // Years whose extraction failed keep their slot, so both of their
        // pairs are reported rather than silently bridged.
        let by_year: BTreeMap<&Year, &Centerline> =
            centerlines.iter().map(|c| (&c.year, &c.centerline)).collect();
        let slots: Vec<PairSlot<'_>> = channels
            .iter()
            .map(|c| PairSlot {
                year: &c.year,
                channel: &c.channel,
                centerline: by_year.get(&c.year).copied(),
            })
            .collect();
        classify_slots(&slots, &config.change)
    };
    failures.extend(changes.failures);
    let changes = changes.items;

    info!("STEP 6 statistics per segment");
    let statistics = Batch::from_results(
        changes
            .iter()
            .map(|layer| {
                let label = layer.period();
                let stats = segment_statistics(layer, &segments).map(|s| (label.clone(), s));
                (label, stats)
            })
            .collect(),
    );
    failures.extend(statistics.failures);
    let statistics: BTreeMap<String, SegmentStatistics> = statistics.items.into_iter().collect();

    info!("STEP 7 floodplain age map");
    let (floodplain_age, floodplain) = floodplain(&channels, &segments, input.hach, input.canopy)?;

    let intermediates = if config.keep_intermediates {
        for pair in channels.windows(2) {
            let uni = envelope(&pair[0].channel, &pair[1].channel)?;
            scratch.layers.envelopes.insert(period(&pair[0].year, &pair[1].year), uni);
        }
        info!("processing layers preserved");
        Some(scratch.into_intermediates())
    } else {
        None
    };

    if !failures.is_empty() {
        warn!(failed = failures.len(), "run finished with units left out");
    }

    Ok(PipelineRun {
        crs: input.crs,
        centerlines,
        composite,
        segments,
        changes,
        statistics,
        floodplain_age,
        floodplain,
        failures,
        intermediates,
    })
}
