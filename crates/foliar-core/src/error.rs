//! Error taxonomy for the diagnosis core.
//!
//! Rejections are not errors: an unsuitable image is a legitimate
//! `Rejected` outcome, handled by the decision policy. Everything here
//! is a genuine fault, converted to an `Error` result at the pipeline
//! boundary so no fault ever escapes to the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Model artifact missing or internally inconsistent. Fatal at
    /// startup; mid-call occurrences become an `Error` result.
    #[error("configuration error: {0}")]
    Config(String),

    /// The produced embedding does not match the dimension the
    /// classifier was fitted on. Never truncated or padded.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The input image could not be decoded.
    #[error("invalid input image: {0}")]
    Input(String),

    /// Any other fault from the inference runtime.
    #[error("{0}")]
    Internal(String),
}
