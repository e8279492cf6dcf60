//! # Chanshift Core
//!
//! Core types, traits and errors for the chanshift channel analysis library.
//!
//! This crate provides:
//! - `Error` / `ErrorKind`: the configuration / topology / geometry error taxonomy
//! - `CRS`: spatial reference descriptor carried unchanged through a run
//! - `Feature` / `AttributeValue`: attribute model used at the I/O boundary
//! - `Year` / `Side`: observation year tokens and bank side labels
//! - `Algorithm` trait for a consistent API

pub mod channel;
pub mod crs;
pub mod error;
pub mod vector;

pub use channel::{Side, Year};
pub use crs::CRS;
pub use error::{Error, ErrorKind, Result};
pub use vector::{AttributeValue, Feature, FeatureCollection, FieldMatch};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::channel::{Side, Year};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, FieldMatch};
    pub use crate::Algorithm;
}

/// A named processing step with typed input, output and parameters.
///
/// Every stage of a run (centerline extraction, segmentation, change
/// classification, statistics) implements this so it can also be driven on
/// its own.
pub trait Algorithm {
    type Input;
    type Output;
    type Params: Default;
    type Error: std::error::Error;

    /// Short stable identifier, used in log lines
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
