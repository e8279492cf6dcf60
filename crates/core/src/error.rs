//! Error types for chanshift

use thiserror::Error;

/// Main error type for chanshift operations
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Field not found: {field}")]
    MissingField { field: String },

    #[error("Observation count mismatch: {channels} channel layers vs {centerlines} centerlines")]
    ObservationCountMismatch { channels: usize, centerlines: usize },

    #[error("Topology error [{context}]: {reason}")]
    Topology { context: String, reason: String },

    #[error("Geometry operation failed: {0}")]
    GeometryOperation(String),
}

/// Coarse classification of an [`Error`].
///
/// Configuration errors are fixed by changing parameters, topology errors by
/// editing the input geometry, geometry-operation errors come from the
/// underlying geometry library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Topology,
    GeometryOperation,
}

impl Error {
    /// Build a topology error for the unit of work named by `context`
    pub fn topology(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Topology {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid parameter error
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter { .. }
            | Error::MissingField { .. }
            | Error::ObservationCountMismatch { .. } => ErrorKind::Configuration,
            Error::Topology { .. } => ErrorKind::Topology,
            Error::GeometryOperation(_) => ErrorKind::GeometryOperation,
        }
    }

    /// Replace the context of a topology error, leaving other errors untouched.
    ///
    /// Lets a caller that knows the year(s) involved annotate errors raised by
    /// year-agnostic algorithms.
    pub fn in_context(self, context: impl Into<String>) -> Self {
        match self {
            Error::Topology { reason, .. } => Error::Topology {
                context: context.into(),
                reason,
            },
            other => other,
        }
    }
}

/// Result type alias for chanshift operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::invalid_parameter("interval", 0.0, "must be positive").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::MissingField { field: "year".into() }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::topology("2001", "branching").kind(), ErrorKind::Topology);
        assert_eq!(
            Error::GeometryOperation("union".into()).kind(),
            ErrorKind::GeometryOperation
        );
    }

    #[test]
    fn test_in_context_rewrites_topology_only() {
        let err = Error::topology("centerline", "2 parts").in_context("2000_2010");
        assert_eq!(err.to_string(), "Topology error [2000_2010]: 2 parts");

        let err = Error::GeometryOperation("clip".into()).in_context("2000");
        assert_eq!(err.to_string(), "Geometry operation failed: clip");
    }
}
