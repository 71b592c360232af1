//! The single tagged error type surfaced by every fallible operation in
//! this crate. Nothing here is retried or silently recovered: an
//! [`Error`] means the caller's request (or the model under construction)
//! is discarded.

use thiserror::Error;

/// The crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A call was made that is illegal in the builder's current state.
    #[error("builder state error: {0}")]
    BuilderState(String),

    /// Metadata contradicts a structural constraint (bad shape, out-of-range
    /// class/target id, wrong leaf shape or type, unknown enum string).
    #[error("validation error: {0}")]
    Validation(String),

    /// A tree contains orphaned nodes, unresolved children, or a cycle.
    #[error("structural error: {0}")]
    Structural(String),

    /// A threshold/leaf type pair is illegal, or predict input type does not
    /// match the model's leaf-output type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Malformed JSON configuration or model JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Version incompatibility, truncated frame, or I/O failure during
    /// (de)serialization.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unknown post-processor name or unknown predict-type.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
