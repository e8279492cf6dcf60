//! # Chanshift Algorithms
//!
//! Channel shifting analysis of multi-year river channel polygons.
//!
//! ## Modules
//!
//! - **vector**: Geometry adapter (densify, Voronoi, overlay, nearest, linear referencing)
//! - **centerline**: Centerline extraction from the Voronoi skeleton of a channel polygon
//! - **segmentation**: Fixed-interval centerline segments with Thiessen cells
//! - **change**: Erosion/deposition classification between two observations
//! - **statistics**: Migration rates, floodplain age and zonal summaries per segment
//! - **pipeline**: Multi-year orchestration

pub(crate) mod maybe_rayon;

pub mod vector;
pub mod centerline;
pub mod segmentation;
pub mod change;
pub mod statistics;
pub mod pipeline;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::centerline::{
        extract_centerline, BearingWindow, Centerline, CenterlineExtractor, CenterlineParams,
    };
    pub use crate::segmentation::{segment_centerline, Segment, SegmentParams, Segmenter};
    pub use crate::change::{
        classify_change, classify_change_with, ChangeClassifier, ChangeParams, ChangeRegion,
        Direction, EaClass, Membership, PeriodInput,
    };
    pub use crate::statistics::{
        floodplain_age, floodplain_statistics, migration_rates, StatisticsAggregator, ZonalSource,
        ZonalSummary,
    };
    pub use crate::pipeline::{
        run, ChannelObservation, CenterlineObservation, PipelineConfig, PipelineInput, PipelineRun,
    };
    pub use chanshift_core::prelude::*;
}
