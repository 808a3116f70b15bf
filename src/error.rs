//! Error types

use thiserror::Error;

/// Errors raised while loading inputs or talking to external services.
///
/// The estimation pipeline itself never fails: unknown values are `None`.
#[derive(Debug, Error)]
pub enum NavError {
    /// The CSV reader failed (I/O or malformed record)
    #[error("CSV error: {0}")]
    Csv(String),

    /// A required CSV column is absent from the header
    #[error("{0} header not found")]
    MissingColumn(&'static str),

    /// A row could not be turned into a sample
    #[error("Error with row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    /// The GPX document could not be read or has no usable points
    #[error("GPX error: {0}")]
    Gpx(String),

    /// The YAML configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No geocoder returned a place for the query
    #[error("Destination not found")]
    DestinationNotFound,

    /// The routing service explicitly answered without a route
    #[error("Could not compute a route")]
    NoRoute,

    /// Transport or protocol failure of an external service
    #[error("Service error: {0}")]
    Service(String),
}

impl NavError {
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn invalid_row(row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            row,
            reason: reason.into(),
        }
    }
}
