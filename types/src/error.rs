//! Validation errors raised while constructing typed values from raw input.

use thiserror::Error;

/// A submission, vote, or query parameter that failed typed construction.
///
/// Always user-correctable: nothing has been hashed, uploaded, or stored
/// by the time one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("unknown report status: {0:?}")]
    UnknownStatus(String),

    #[error("unknown vote choice: {0:?}")]
    UnknownVote(String),

    #[error("AI confidence score {0} is outside [0.0, 1.0]")]
    ScoreOutOfRange(f64),

    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("file data is not valid base64: {0}")]
    InvalidFileData(String),

    #[error("user id {0:?} is reserved")]
    ReservedUser(&'static str),
}
