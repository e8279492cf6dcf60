//! Polygon overlay: union, intersection, difference, dissolve, hole filling
//!
//! Thin wrappers over `geo::BooleanOps`. The boolean kernel panics on some
//! degenerate inputs; every call is guarded so that a panic or a non-finite
//! coordinate in the output is reported as a `GeometryOperation` error for the
//! current unit of work instead of unwinding through the caller.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chanshift_core::{Error, Result};
use geo::{Area, BooleanOps, CoordsIter, MultiPolygon, Polygon};

fn guarded<F>(op: &str, f: F) -> Result<MultiPolygon<f64>>
where
    F: FnOnce() -> MultiPolygon<f64>,
{
    let out = catch_unwind(AssertUnwindSafe(f))
        .map_err(|_| Error::GeometryOperation(format!("{op}: boolean kernel panicked")))?;
    if out.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::GeometryOperation(format!(
            "{op}: non-finite coordinate in result"
        )));
    }
    Ok(out)
}

pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    if a.0.is_empty() {
        return Ok(b.clone());
    }
    if b.0.is_empty() {
        return Ok(a.clone());
    }
    guarded("union", || a.union(b))
}

pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    if a.0.is_empty() || b.0.is_empty() {
        return Ok(MultiPolygon::new(vec![]));
    }
    guarded("intersection", || a.intersection(b))
}

pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    if a.0.is_empty() || b.0.is_empty() {
        return Ok(a.clone());
    }
    guarded("difference", || a.difference(b))
}

/// Union of any number of polygons.
pub fn union_all<'a, I>(parts: I) -> Result<MultiPolygon<f64>>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    parts
        .into_iter()
        .try_fold(MultiPolygon::new(vec![]), |acc, mp| union(&acc, mp))
}

/// Keep only the outer ring of every part.
///
/// Parts that overlap once their holes are gone (an island part sitting in
/// another part's hole) are dissolved together.
pub fn fill_holes(mp: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
    let mut shells: Vec<MultiPolygon<f64>> = mp
        .0
        .iter()
        .map(|p| MultiPolygon::new(vec![Polygon::new(p.exterior().clone(), vec![])]))
        .collect();
    match shells.len() {
        0 => Ok(MultiPolygon::new(vec![])),
        1 => Ok(shells.swap_remove(0)),
        _ => union_all(&shells),
    }
}

/// Merge polygons sharing a key. The map keeps keys sorted, which makes the
/// output order deterministic.
pub fn dissolve<K, I>(items: I) -> Result<BTreeMap<K, MultiPolygon<f64>>>
where
    K: Ord,
    I: IntoIterator<Item = (K, MultiPolygon<f64>)>,
{
    let mut groups: BTreeMap<K, Vec<MultiPolygon<f64>>> = BTreeMap::new();
    for (key, mp) in items {
        groups.entry(key).or_default().push(mp);
    }
    groups
        .into_iter()
        .map(|(key, parts)| Ok((key, union_all(&parts)?)))
        .collect()
}

/// Drop parts whose area does not exceed `min_area`.
pub fn remove_slivers(mp: MultiPolygon<f64>, min_area: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(
        mp.0.into_iter()
            .filter(|p| p.unsigned_area() > min_area)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, LineString};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]])
    }

    #[test]
    fn test_union_and_intersection_areas() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 0.0, 15.0, 10.0);
        assert_relative_eq!(union(&a, &b).unwrap().unsigned_area(), 150.0, epsilon = 1e-9);
        assert_relative_eq!(intersection(&a, &b).unwrap().unsigned_area(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(difference(&a, &b).unwrap().unsigned_area(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_operands() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let empty = MultiPolygon::new(vec![]);
        assert!(intersection(&a, &empty).unwrap().0.is_empty());
        assert_relative_eq!(difference(&a, &empty).unwrap().unsigned_area(), 1.0);
        assert_relative_eq!(union(&empty, &a).unwrap().unsigned_area(), 1.0);
    }

    #[test]
    fn test_fill_holes_merges_nested_island() {
        let ring = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0)])],
        );
        let island = rect(4.0, 4.0, 6.0, 6.0).0.remove(0);
        let filled = fill_holes(&MultiPolygon::new(vec![ring, island])).unwrap();
        assert_eq!(filled.0.len(), 1);
        assert!(filled.0[0].interiors().is_empty());
        assert_relative_eq!(filled.unsigned_area(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dissolve_groups_by_key() {
        let items = vec![
            ("b", rect(0.0, 0.0, 1.0, 1.0)),
            ("a", rect(5.0, 5.0, 6.0, 6.0)),
            ("b", rect(1.0, 0.0, 2.0, 1.0)),
        ];
        let out = dissolve(items).unwrap();
        let keys: Vec<&str> = out.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_relative_eq!(out["b"].unsigned_area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_remove_slivers() {
        let mut mp = rect(0.0, 0.0, 10.0, 10.0);
        mp.0.push(rect(20.0, 0.0, 20.001, 0.001).0.remove(0));
        assert_eq!(remove_slivers(mp, 1e-3).0.len(), 1);
    }
}
