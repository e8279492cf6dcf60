//! Bearing folding and the bank-orientation window
//!
//! Bearings are arithmetic angles (east = 0, counter-clockwise positive) in
//! `[-180, 180]`. Folding maps them onto `[0, 180]` so that a segment and its
//! reverse compare equal-ish regardless of digitizing direction.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Fold an angle in `[-180, 180]` onto `[0, 180]`.
///
/// Non-negative angles pass through; negative ones become `180 - |θ|`.
pub fn normalize(theta: f64) -> f64 {
    if theta >= 0.0 {
        theta
    } else {
        180.0 - theta.abs()
    }
}

/// Arithmetic bearing in degrees from `from` to `to`, in `[-180, 180]`.
pub fn bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Open interval of accepted differences between a skeleton edge's folded
/// bearing and the folded bearing of its nearest-bank connector.
///
/// An edge running along the channel meets its bank connector near 90°;
/// spurs pointing at the bank meet it near 0° or 180°.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingWindow {
    /// Exclusive lower bound in degrees
    pub min: f64,
    /// Exclusive upper bound in degrees
    pub max: f64,
}

impl Default for BearingWindow {
    fn default() -> Self {
        Self { min: 50.0, max: 130.0 }
    }
}

impl BearingWindow {
    /// `true` iff `min < diff < max`.
    pub fn keeps(&self, diff: f64) -> bool {
        diff > self.min && diff < self.max
    }

    /// Difference between the folded edge bearing and the folded connector
    /// bearing.
    pub fn difference(edge: (Coord<f64>, Coord<f64>), connector: (Coord<f64>, Coord<f64>)) -> f64 {
        let edge = normalize(bearing(edge.0, edge.1));
        let near = normalize(bearing(connector.0, connector.1));
        (edge - near).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn test_normalize() {
        assert_relative_eq!(normalize(-30.0), 150.0);
        assert_relative_eq!(normalize(-45.0), 135.0);
        assert_relative_eq!(normalize(90.0), 90.0);
        assert_relative_eq!(normalize(0.0), 0.0);
    }

    #[test]
    fn test_window_bounds_are_exclusive() {
        let w = BearingWindow::default();
        assert!(!w.keeps(49.0));
        assert!(w.keeps(51.0));
        assert!(w.keeps(129.0));
        assert!(!w.keeps(130.0));
        assert!(!w.keeps(50.0));
    }

    #[test]
    fn test_axis_edge_against_bank_connector() {
        // Edge along x, connector down to the bank
        let diff = BearingWindow::difference((c(0.0, 5.0), c(2.0, 5.0)), (c(1.0, 5.0), c(1.0, 0.0)));
        assert_relative_eq!(diff, 90.0);
        assert!(BearingWindow::default().keeps(diff));
    }

    #[test]
    fn test_spur_towards_bank_is_rejected() {
        // Edge pointing at the bank, connector continues the same way
        let diff = BearingWindow::difference((c(1.0, 3.0), c(1.0, 1.0)), (c(1.0, 1.0), c(1.0, 0.0)));
        assert_relative_eq!(diff, 0.0);
        assert!(!BearingWindow::default().keeps(diff));
    }

    #[test]
    fn test_bearing_quadrants() {
        assert_relative_eq!(bearing(c(0.0, 0.0), c(0.0, -1.0)), -90.0);
        assert_relative_eq!(normalize(bearing(c(0.0, 0.0), c(-1.0, -1.0))), 45.0);
    }
}
