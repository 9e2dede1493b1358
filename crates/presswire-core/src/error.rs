//! Error types for Presswire core.

use thiserror::Error;

use crate::content::RiskFlagType;

/// Input-boundary validation failures.
///
/// These are caught before any pipeline logic runs and map to HTTP 400 at
/// the transport boundary. Each variant carries enough field-level detail
/// for the caller to fix the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("headline must not be empty")]
    EmptyHeadline,

    #[error("headline exceeds {max} characters (got {got})")]
    HeadlineTooLong { max: usize, got: usize },

    #[error("a version requires at least one content block")]
    NoContentBlocks,

    #[error("content block {index} is empty")]
    EmptyContentBlock { index: usize },

    #[error("source log entry {index} has an empty source")]
    EmptySource { index: usize },

    #[error("risk flag {flag_type} has an empty description")]
    EmptyRiskDescription { flag_type: RiskFlagType },

    #[error("acknowledgement of {flag_type} requires a non-empty justification")]
    MissingJustification { flag_type: RiskFlagType },

    #[error("duplicate acknowledgement for {flag_type}")]
    DuplicateAcknowledgement { flag_type: RiskFlagType },

    #[error("unknown enum value for {field}: {value}")]
    UnknownEnumValue { field: &'static str, value: String },

    #[error("malformed version hash: {0}")]
    MalformedHash(String),
}
