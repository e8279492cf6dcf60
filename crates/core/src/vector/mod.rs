//! Feature and attribute model
//!
//! Features are what external readers hand to chanshift and what chanshift
//! hands back for persistence: a geo-types geometry plus a flat attribute map.

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::channel::Year;
use crate::error::{Error, Result};

/// Scalar attribute stored on a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Render the value as a year token.
    ///
    /// Integral floats are written without a fractional part so that a year
    /// stored as `2010.0` reads back as `2010`.
    pub fn as_year(&self) -> Option<Year> {
        let token = match self {
            AttributeValue::Int(v) => v.to_string(),
            AttributeValue::Float(v) if v.is_finite() && v.fract() == 0.0 => (*v as i64).to_string(),
            AttributeValue::Float(v) if v.is_finite() => v.to_string(),
            AttributeValue::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };
        Some(Year::new(token))
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("NULL"),
            AttributeValue::Bool(v) => v.fmt(f),
            AttributeValue::Int(v) => v.fmt(f),
            AttributeValue::Float(v) => v.fmt(f),
            AttributeValue::String(v) => f.write_str(v),
        }
    }
}

macro_rules! attribute_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for AttributeValue {
            fn from(v: $ty) -> Self {
                AttributeValue::$variant(v.into())
            }
        })*
    };
}

attribute_from!(bool => Bool, i64 => Int, f64 => Float, String => String, &str => String);

/// Output record: one geometry and its attribute table row.
///
/// Attributes are kept sorted by name so written layers have a stable
/// column order.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// How a year field name is matched against a layer's attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMatch {
    /// Attribute name equals the requested name
    Exact,
    /// First attribute name (in sorted order) containing the requested name
    Contains,
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Resolve the attribute name a layer stores its year under.
    pub fn resolve_field(&self, name: &str, matching: FieldMatch) -> Result<String> {
        let names: BTreeSet<&String> = self.features.iter().flat_map(|f| f.properties.keys()).collect();

        let found = match matching {
            FieldMatch::Exact => names.into_iter().find(|n| n.as_str() == name),
            FieldMatch::Contains => names.into_iter().find(|n| n.contains(name)),
        };
        found.cloned().ok_or_else(|| Error::MissingField {
            field: name.to_string(),
        })
    }

    /// Read the observation year of a single-year layer.
    ///
    /// The layer is expected to hold one year; the value of the last feature
    /// carrying the field wins.
    pub fn year(&self, name: &str, matching: FieldMatch) -> Result<Year> {
        let field = self.resolve_field(name, matching)?;
        self.features
            .iter()
            .rev()
            .filter_map(|f| f.get_property(&field))
            .find_map(AttributeValue::as_year)
            .ok_or(Error::MissingField { field })
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Point};

    fn layer(field: &str, value: AttributeValue) -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(Point::new(0.0, 0.0)).with_property(field, value));
        fc
    }

    #[test]
    fn test_year_exact_field() {
        let fc = layer("year", AttributeValue::Int(2010));
        assert_eq!(fc.year("year", FieldMatch::Exact).unwrap().as_str(), "2010");
    }

    #[test]
    fn test_year_missing_field() {
        let fc = layer("rok", AttributeValue::Int(2010));
        let err = fc.year("year", FieldMatch::Exact).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_year_contains_field() {
        let fc = layer("cnt_year", AttributeValue::String("1998b".into()));
        let year = fc.year("year", FieldMatch::Contains).unwrap();
        assert_eq!(year.as_str(), "1998b");
        assert_eq!(year.numeric(), Some(1998));
    }

    #[test]
    fn test_integral_float_year() {
        assert_eq!(AttributeValue::Float(2004.0).as_year().unwrap().as_str(), "2004");
        assert!(AttributeValue::Null.as_year().is_none());
    }

    #[test]
    fn test_display_and_conversions() {
        assert_eq!(AttributeValue::from(true), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::from("LEFT").to_string(), "LEFT");
        assert_eq!(AttributeValue::Null.to_string(), "NULL");
    }

    #[test]
    fn test_feature_builder() {
        let f = Feature::new(point!(x: 1.0, y: 2.0))
            .with_property("EA", "erosion")
            .with_property("span_year", 10i64);
        assert_eq!(f.get_property("EA"), Some(&AttributeValue::String("erosion".into())));
        assert_eq!(f.get_property("span_year"), Some(&AttributeValue::Int(10)));
    }
}
