//! Spatial reference descriptor
//!
//! Chanshift never reprojects. The descriptor read with the input layers is
//! carried unchanged to every output so the caller can write them back with the
//! same reference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque spatial reference of the input layers.
///
/// Either an authority code, a WKT definition, or nothing at all for local
/// survey coordinates. Distances and areas are always taken in layer units.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CRS {
    #[default]
    Local,
    Epsg(u32),
    Wkt(String),
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        CRS::Epsg(code)
    }

    pub fn from_wkt(definition: impl Into<String>) -> Self {
        CRS::Wkt(definition.into())
    }

    /// Layers without a declared reference
    pub fn unknown() -> Self {
        CRS::Local
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            CRS::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    pub fn wkt(&self) -> Option<&str> {
        match self {
            CRS::Wkt(definition) => Some(definition),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, CRS::Local)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CRS::Local => f.write_str("local"),
            CRS::Epsg(code) => write!(f, "EPSG:{code}"),
            // WKT heads are enough to tell definitions apart in logs
            CRS::Wkt(definition) => {
                let head: String = definition.chars().take(40).collect();
                write!(f, "WKT {head}")
            }
        }
    }
}
