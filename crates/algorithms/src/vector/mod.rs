//! Geometry adapter
//!
//! The small set of vector operations the channel analysis needs:
//! - Densify: regular boundary spacing
//! - Voronoi: skeleton edges and Thiessen cells
//! - Overlay: union, intersection, difference, dissolve, hole filling
//! - Nearest: connectors, snapping, ray casting
//! - Linear referencing, simplification, measurements

mod clip;
mod densify;
mod linear;
mod measurements;
mod nearest;
mod overlay;
mod simplify;
mod spatial;
mod voronoi;

pub use clip::{clip_convex, HalfPlane};
pub use densify::densify_polygon;
pub use linear::{locate, point_at_distance, substring};
pub use measurements::{perimeter, vertex_count, vertex_density};
pub use nearest::{
    boundary_segments, closest_points, cross, nearest_connector,
    ray_hit, segment_intersection, snap_to_segments,
};
pub use overlay::{difference, dissolve, fill_holes, intersection, remove_slivers, union, union_all};
pub use simplify::simplify_dp;
pub use spatial::{extent, interior_point};
pub use voronoi::{voronoi_cells, voronoi_edges};
