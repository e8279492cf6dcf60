//! Per-segment statistics
//!
//! - **migration**: erosion/deposition rates and change regions per segment
//! - **floodplain**: floodplain age map and zonal summaries per segment

pub mod floodplain;
pub mod migration;

pub use floodplain::{floodplain_age, floodplain_statistics, FloodplainPiece, ZonalSource, ZonalSummary};
pub use migration::{change_per_segment, migration_rates, signed_rate, MigrationRate, SegmentChange};

use chanshift_core::{Algorithm, Error, Result};

use crate::change::ChangeRegion;
use crate::segmentation::Segment;

/// Change statistics of one year pair along the segmented channel
#[derive(Debug, Clone, Default)]
pub struct SegmentStatistics {
    pub rates: Vec<MigrationRate>,
    pub changes: Vec<SegmentChange>,
}

/// Aggregates change regions over channel segments
#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator;

impl Algorithm for StatisticsAggregator {
    type Input = (Vec<ChangeRegion>, Vec<Segment>);
    type Output = SegmentStatistics;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "StatisticsAggregator"
    }

    fn description(&self) -> &'static str {
        "Migration rates and change regions per channel segment"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let (regions, segments) = input;
        Ok(SegmentStatistics {
            rates: migration_rates(&regions, &segments)?,
            changes: change_per_segment(&regions, &segments)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Direction, EaClass};
    use chanshift_core::Side;
    use geo::{polygon, LineString, MultiPolygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]])
    }

    #[test]
    fn test_aggregator_runs_both_tables() {
        let regions = vec![ChangeRegion {
            geometry: rect(0.0, 20.0, 40.0, 25.0),
            ea: EaClass::Erosion,
            direction: Direction::Bank(Side::Left),
            migration: "erosion_LEFT".to_string(),
            period: "1990_2000".to_string(),
            span_year: 10,
        }];
        let segments = vec![Segment {
            id: 0,
            line: LineString::from(vec![(0.0, 10.0), (40.0, 10.0)]),
            cell: rect(0.0, 0.0, 40.0, 30.0),
            distance: 40.0,
        }];

        let stats = StatisticsAggregator.execute_default((regions, segments)).unwrap();
        assert_eq!(stats.rates.len(), 1);
        assert_eq!(stats.changes.len(), 1);
        assert!((stats.rates[0].rate_area - 20.0).abs() < 1e-9);
        assert!((stats.rates[0].rate_lateral - 0.5).abs() < 1e-9);
    }
}
