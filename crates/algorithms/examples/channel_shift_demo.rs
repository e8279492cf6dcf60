//! Channel shifting demo: three synthetic observations of a migrating bend
//!
//! Builds a meandering channel for 1990, 2000 and 2010, each shifted a
//! little further north-east, runs the whole analysis and prints:
//!   1. the per-year centerlines (parts and length)
//!   2. the segments of the composite centerline
//!   3. erosion/deposition areas per period
//!   4. the floodplain age map
//!
//! Run:
//!   cargo run -p chanshift-algorithms --example channel_shift_demo

use chanshift_algorithms::pipeline::{run, ChannelObservation, PipelineConfig, PipelineInput};
use chanshift_algorithms::segmentation::SegmentParams;
use chanshift_core::CRS;
use geo::{Area, LineString, MultiPolygon, Polygon};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const LENGTH: usize = 300;
const WIDTH: f64 = 24.0;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let channels = vec![
        ChannelObservation::new("1990", bend(0.0, 0.0)),
        ChannelObservation::new("2000", bend(2.0, 3.0)),
        ChannelObservation::new("2010", bend(4.0, 7.0)),
    ];

    let config = PipelineConfig {
        segmentation: SegmentParams {
            interval: 50.0,
            simplification: 0.5,
        },
        ..Default::default()
    };

    let result = match run(&config, PipelineInput::new(CRS::from_epsg(32634), channels)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("run failed: {e}");
            std::process::exit(1);
        }
    };

    println!("\nCenterlines:");
    for obs in &result.centerlines {
        println!(
            "  {}: {} part(s), {:.1} m",
            obs.year,
            obs.centerline.part_count(),
            obs.centerline.length()
        );
    }

    println!("\nSegments ({}):", result.segments.len());
    for s in &result.segments {
        println!("  ID_SEQ {:>2}  cell {:>8.1} m2", s.id, s.cell.unsigned_area());
    }

    for layer in &result.changes {
        println!("\nChange {}:", layer.period());
        for r in &layer.regions {
            println!("  {:<20} {:>10.1} m2  (span {} y)", r.migration, r.area(), r.span_year);
        }
    }

    for failure in &result.failures {
        println!("\nSkipped {}: {}", failure.unit, failure.error);
    }

    println!("\nFloodplain age:");
    for (year, region) in &result.floodplain_age {
        println!("  {year}: {:.1} m2", region.unsigned_area());
    }
}

/// Meandering channel of constant width, shifted by `(dx, dy)`
fn bend(dx: f64, dy: f64) -> MultiPolygon<f64> {
    let axis = |x: f64| dy + 30.0 * (x / 80.0).sin();
    let xs: Vec<f64> = (0..=LENGTH / 2).map(|i| (2 * i) as f64).collect();
    let mut coords: Vec<(f64, f64)> = xs.iter().map(|&x| (x + dx, axis(x) - WIDTH / 2.0)).collect();
    coords.extend(xs.iter().rev().map(|&x| (x + dx, axis(x) + WIDTH / 2.0)));
    coords.push(coords[0]);
    MultiPolygon::new(vec![Polygon::new(LineString::from(coords), vec![])])
}
