//! Line generalization (Douglas-Peucker)

use geo::{LineString, Simplify};

/// Simplify a line with Douglas-Peucker.
///
/// Vertices deviating less than `tolerance` from the simplified line are
/// removed; both endpoints always survive. A tolerance of zero or less
/// returns the line unchanged.
pub fn simplify_dp(line: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    if tolerance > 0.0 {
        line.simplify(&tolerance)
    } else {
        line.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag_line() -> LineString<f64> {
        LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.1),
            (2.0, 0.0),
            (3.0, -0.05),
            (4.0, 0.0),
            (5.0, 0.2),
            (6.0, 0.0),
            (10.0, 0.0),
        ])
    }

    #[test]
    fn test_simplify_dp_reduces_vertices() {
        let simplified = simplify_dp(&zigzag_line(), 0.15);
        assert!(simplified.0.len() < zigzag_line().0.len());
        assert_eq!(simplified.0.first().unwrap().x, 0.0);
        assert_eq!(simplified.0.last().unwrap().x, 10.0);
    }

    #[test]
    fn test_simplify_dp_high_tolerance() {
        assert_eq!(simplify_dp(&zigzag_line(), 10.0).0.len(), 2);
    }

    #[test]
    fn test_simplify_dp_zero_tolerance() {
        assert_eq!(simplify_dp(&zigzag_line(), 0.0).0.len(), zigzag_line().0.len());
    }
}
